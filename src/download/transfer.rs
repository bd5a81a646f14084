//! The read loops behind every transfer.
//!
//! A [`TransferJob`] owns a snapshot of the request, client and listeners so
//! it can run either on the caller's task or on a spawned one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::HttpClient;
use super::error::DownloadError;
use super::events::{FileCompletedEvent, ProgressEvent, StringCompletedEvent, TransferOutcome};
use super::listeners::Listeners;
use super::request::TransferRequest;

/// Lifecycle of a single transfer.
///
/// `Idle → Connecting → Transferring → Completing → Done`, with any I/O
/// error moving to `Failed` before `Completing`. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Idle,
    Connecting,
    Transferring,
    Failed,
    Completing,
    Done,
}

impl TransferPhase {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Connecting)
                | (Self::Connecting, Self::Transferring | Self::Failed)
                | (Self::Transferring, Self::Completing | Self::Failed)
                | (Self::Failed, Self::Completing)
                | (Self::Completing, Self::Done)
        )
    }
}

/// Result of a successful file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransfer {
    /// File the body was written to.
    pub destination: PathBuf,
    /// Bytes written to `destination`.
    pub bytes_written: u64,
    /// Declared content length, when the server sent one.
    pub total_bytes: Option<u64>,
}

/// Tracks the phase of one transfer and logs each transition.
#[derive(Debug)]
struct PhaseTracker<'a> {
    source: &'a Url,
    phase: TransferPhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(source: &'a Url) -> Self {
        Self {
            source,
            phase: TransferPhase::Idle,
        }
    }

    fn advance(&mut self, next: TransferPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transfer transition {:?} -> {next:?}",
            self.phase
        );
        debug!(url = %self.source, from = ?self.phase, to = ?next, "transfer phase");
        self.phase = next;
    }
}

/// Everything one transfer needs, detached from the owning downloader.
#[derive(Debug, Clone)]
pub(crate) struct TransferJob {
    pub(crate) client: HttpClient,
    pub(crate) request: TransferRequest,
    pub(crate) listeners: Arc<Listeners>,
    pub(crate) chunk_size: usize,
}

impl TransferJob {
    fn source(&self) -> &Url {
        self.request.source()
    }

    /// Streams the response body into the destination file.
    ///
    /// File-complete listeners run whether or not the loop succeeded; the
    /// error, if any, is returned after they have run. A failed transfer may
    /// leave a truncated file behind.
    #[instrument(skip(self), fields(url = %self.request.source()))]
    pub(crate) async fn run_file(&self) -> Result<FileTransfer, DownloadError> {
        let destination = self
            .request
            .destination()
            .map(Path::to_path_buf)
            .ok_or_else(|| DownloadError::missing_destination(self.source().as_str()))?;

        let mut phase = PhaseTracker::new(self.source());
        let mut progress = FileProgress::default();
        let result = self
            .copy_to_file(&destination, &mut phase, &mut progress)
            .await;

        let outcome = finish(&mut phase, result.as_ref().err());
        self.listeners.emit_file_completed(&FileCompletedEvent {
            source: self.source().clone(),
            destination: destination.clone(),
            outcome,
        });
        phase.advance(TransferPhase::Done);

        result?;
        info!(
            path = %destination.display(),
            bytes = progress.bytes_written,
            "download complete"
        );
        Ok(FileTransfer {
            destination,
            bytes_written: progress.bytes_written,
            total_bytes: progress.total_bytes,
        })
    }

    async fn copy_to_file(
        &self,
        destination: &Path,
        phase: &mut PhaseTracker<'_>,
        progress: &mut FileProgress,
    ) -> Result<(), DownloadError> {
        phase.advance(TransferPhase::Connecting);
        let response = self.client.get(self.source()).await?;
        progress.total_bytes = response.content_length();

        let file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        let mut writer = BufWriter::new(file);
        phase.advance(TransferPhase::Transferring);

        let copied = self
            .write_body(response, &mut writer, destination, progress)
            .await;
        if let Err(error) = copied {
            // Keep exactly the reported bytes on disk before surfacing the failure.
            if let Err(flush_error) = writer.flush().await {
                warn!(
                    path = %destination.display(),
                    error = %flush_error,
                    "failed to flush partial file"
                );
            }
            return Err(error);
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        Ok(())
    }

    async fn write_body(
        &self,
        response: reqwest::Response,
        writer: &mut BufWriter<File>,
        destination: &Path,
        progress: &mut FileProgress,
    ) -> Result<(), DownloadError> {
        let mut stream = response.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk =
                chunk_result.map_err(|e| DownloadError::network(self.source().as_str(), e))?;

            for piece in chunk.chunks(self.chunk_size) {
                writer
                    .write_all(piece)
                    .await
                    .map_err(|e| DownloadError::io(destination, e))?;
                progress.bytes_written += piece.len() as u64;

                self.listeners.emit_progress(&ProgressEvent::new(
                    self.source(),
                    Some(destination.to_path_buf()),
                    progress.bytes_written,
                    progress.total_bytes,
                ));
            }
        }
        Ok(())
    }

    /// Reads the response body as text, one line at a time.
    ///
    /// Each line keeps its own terminator and is followed by an extra `"\n"`,
    /// so `"a\nb\n"` accumulates as `"a\n\nb\n\n"`. String-complete listeners
    /// see whatever was accumulated, even when the loop failed.
    #[instrument(skip(self), fields(url = %self.request.source()))]
    pub(crate) async fn run_string(&self) -> Result<String, DownloadError> {
        let mut phase = PhaseTracker::new(self.source());
        let mut text = String::new();
        let result = self.read_lines(&mut phase, &mut text).await;

        let outcome = finish(&mut phase, result.as_ref().err());
        self.listeners.emit_string_completed(&StringCompletedEvent {
            source: self.source().clone(),
            text: text.clone(),
            outcome,
        });
        phase.advance(TransferPhase::Done);

        result?;
        info!(chars = text.chars().count(), "string download complete");
        Ok(text)
    }

    async fn read_lines(
        &self,
        phase: &mut PhaseTracker<'_>,
        text: &mut String,
    ) -> Result<(), DownloadError> {
        phase.advance(TransferPhase::Connecting);
        let response = self.client.get(self.source()).await?;
        let total_bytes = response.content_length();
        let mut stream = response.bytes_stream();
        phase.advance(TransferPhase::Transferring);

        let mut lines = LineSplitter::default();
        let mut consumed: u64 = 0;
        while let Some(chunk_result) = stream.next().await {
            let chunk =
                chunk_result.map_err(|e| DownloadError::network(self.source().as_str(), e))?;
            lines.push(&chunk);
            while let Some(line) = lines.next_line() {
                self.append_text_line(text, &line, &mut consumed, total_bytes);
            }
        }
        if let Some(rest) = lines.finish() {
            self.append_text_line(text, &rest, &mut consumed, total_bytes);
        }
        Ok(())
    }

    /// Appends one line and reports progress in bytes consumed from the body.
    fn append_text_line(
        &self,
        text: &mut String,
        line: &[u8],
        consumed: &mut u64,
        total_bytes: Option<u64>,
    ) {
        *consumed += line.len() as u64;
        append_line(text, line);
        self.listeners.emit_progress(&ProgressEvent::new(
            self.source(),
            None,
            *consumed,
            total_bytes,
        ));
    }
}

#[derive(Debug, Default)]
struct FileProgress {
    bytes_written: u64,
    total_bytes: Option<u64>,
}

/// Moves the tracker through `Failed` (when needed) into `Completing` and
/// builds the outcome listeners will see.
fn finish(phase: &mut PhaseTracker<'_>, error: Option<&DownloadError>) -> TransferOutcome {
    match error {
        Some(error) => {
            warn!(url = %phase.source, error = %error, "transfer failed");
            phase.advance(TransferPhase::Failed);
            phase.advance(TransferPhase::Completing);
            TransferOutcome::Failed {
                message: error.to_string(),
            }
        }
        None => {
            phase.advance(TransferPhase::Completing);
            TransferOutcome::Completed
        }
    }
}

fn append_line(text: &mut String, line: &[u8]) {
    text.push_str(&String::from_utf8_lossy(line));
    text.push('\n');
}

/// Splits a byte stream on `\n`, keeping the terminator with each line.
#[derive(Debug, Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    fn next_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|b| *b == b'\n')?;
        Some(self.pending.drain(..=end).collect())
    }

    /// Returns the trailing unterminated line, if any.
    fn finish(&mut self) -> Option<Vec<u8>> {
        (!self.pending.is_empty()).then(|| std::mem::take(&mut self.pending))
    }
}
