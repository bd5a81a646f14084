//! Event records handed to registered listeners.
//!
//! Every record carries the transfer's source and destination so a listener
//! shared between several downloaders can tell transfers apart.

use std::path::PathBuf;

use serde::Serialize;
use url::Url;

/// The kinds of event a [`Downloader`](super::Downloader) can narrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A chunk (file) or line (string) was read.
    Progress,
    /// A file transfer's read loop ended.
    FileCompleted,
    /// A string transfer's read loop ended.
    StringCompleted,
    /// A raw byte-buffer transfer ended. No transfer path emits this yet.
    DataCompleted,
}

/// How a transfer's read loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferOutcome {
    /// Reached end of stream and flushed everything.
    Completed,
    /// Stopped on an error; the same error is returned to the caller.
    Failed {
        /// Display text of the error.
        message: String,
    },
}

impl TransferOutcome {
    /// Returns true for [`TransferOutcome::Completed`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// One progress sample, emitted per chunk or line read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Where the bytes come from.
    pub source: Url,
    /// Where the bytes go; `None` for string transfers.
    pub destination: Option<PathBuf>,
    /// Bytes transferred so far.
    pub bytes_transferred: u64,
    /// Declared content length, when the server sent one.
    pub total_bytes: Option<u64>,
    /// `bytes_transferred / total_bytes * 100`, or `None` when the total is unknown.
    pub percentage: Option<f64>,
}

impl ProgressEvent {
    pub(crate) fn new(
        source: &Url,
        destination: Option<PathBuf>,
        bytes_transferred: u64,
        total_bytes: Option<u64>,
    ) -> Self {
        Self {
            source: source.clone(),
            destination,
            bytes_transferred,
            total_bytes,
            percentage: percentage(bytes_transferred, total_bytes),
        }
    }
}

/// Fired once when a file transfer's read loop ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCompletedEvent {
    /// Where the bytes came from.
    pub source: Url,
    /// The file that was written (possibly truncated on failure).
    pub destination: PathBuf,
    /// Whether the read loop reached end of stream.
    pub outcome: TransferOutcome,
}

/// Fired once when a string transfer's read loop ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringCompletedEvent {
    /// Where the text came from.
    pub source: Url,
    /// Everything accumulated before the loop ended (partial on failure).
    pub text: String,
    /// Whether the read loop reached end of stream.
    pub outcome: TransferOutcome,
}

/// Payload for data-complete listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataCompletedEvent {
    /// Where the bytes came from.
    pub source: Url,
    /// The raw body received before the loop ended.
    pub data: Vec<u8>,
    /// Whether the read loop reached end of stream.
    pub outcome: TransferOutcome,
}

/// Computes a completion percentage from a byte count and a declared length.
///
/// The declared length is only a hint: an absent or zero total yields `None`,
/// and overshooting it is capped at 100.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(done: u64, total: Option<u64>) -> Option<f64> {
    let total = total.filter(|t| *t > 0)?;
    Some((done as f64 / total as f64 * 100.0).min(100.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_half() {
        assert_eq!(percentage(512, Some(1024)), Some(50.0));
    }

    #[test]
    fn test_percentage_unknown_total_is_none() {
        assert_eq!(percentage(100, None), None);
    }

    #[test]
    fn test_percentage_zero_total_is_none() {
        assert_eq!(percentage(0, Some(0)), None);
        assert_eq!(percentage(10, Some(0)), None);
    }

    #[test]
    fn test_percentage_caps_at_hundred() {
        assert_eq!(percentage(2048, Some(1024)), Some(100.0));
    }

    #[test]
    fn test_progress_event_computes_percentage() {
        let url = Url::parse("https://example.com/f").unwrap();
        let event = ProgressEvent::new(&url, None, 25, Some(100));
        assert_eq!(event.percentage, Some(25.0));
        assert_eq!(event.total_bytes, Some(100));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let failed = TransferOutcome::Failed {
            message: "boom".to_string(),
        };
        let json = serde_json::to_string(&failed).unwrap();
        assert_eq!(json, r#"{"status":"failed","message":"boom"}"#);
        assert!(!failed.is_success());
        assert!(TransferOutcome::Completed.is_success());
    }

    #[test]
    fn test_progress_event_serializes_url_as_string() {
        let url = Url::parse("https://example.com/f").unwrap();
        let event = ProgressEvent::new(&url, None, 1, None);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["source"], "https://example.com/f");
        assert!(value["percentage"].is_null());
    }
}
