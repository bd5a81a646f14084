//! Per-call handle for background transfers.
//!
//! The spawned task reports its result over a oneshot channel. The caller can
//! poll the handle without blocking or await it; errors never cross the task
//! boundary as panics.

use tokio::sync::oneshot;
use url::Url;

use super::error::DownloadError;

enum Slot<T> {
    Pending(oneshot::Receiver<Result<T, DownloadError>>),
    Ready(Result<T, DownloadError>),
}

/// Handle to one background transfer.
///
/// There is no cancellation: dropping the handle detaches the transfer, which
/// still runs to completion and still notifies its listeners.
pub struct TransferHandle<T> {
    source: Url,
    slot: Slot<T>,
}

impl<T> TransferHandle<T> {
    pub(crate) fn new(source: Url, receiver: oneshot::Receiver<Result<T, DownloadError>>) -> Self {
        Self {
            source,
            slot: Slot::Pending(receiver),
        }
    }

    /// The source locator of the transfer.
    #[must_use]
    pub fn source(&self) -> &Url {
        &self.source
    }

    /// Checks for a result without blocking.
    ///
    /// Returns `None` while the transfer is still running. Once the result
    /// arrives it stays available for later calls.
    pub fn poll_result(&mut self) -> Option<&Result<T, DownloadError>> {
        if let Slot::Pending(receiver) = &mut self.slot {
            let result = match receiver.try_recv() {
                Ok(result) => result,
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => {
                    Err(DownloadError::task_aborted(self.source.as_str()))
                }
            };
            self.slot = Slot::Ready(result);
        }
        match &self.slot {
            Slot::Ready(result) => Some(result),
            Slot::Pending(_) => None,
        }
    }

    /// Returns true once the transfer has reported (success or failure).
    pub fn is_finished(&mut self) -> bool {
        self.poll_result().is_some()
    }

    /// The error captured from the background transfer, if it failed.
    ///
    /// `None` both while running and after a success.
    pub fn error(&mut self) -> Option<&DownloadError> {
        self.poll_result().and_then(|result| result.as_ref().err())
    }

    /// Waits for the transfer to finish and returns its result.
    ///
    /// # Errors
    ///
    /// Returns the transfer's own error, or [`DownloadError::TaskAborted`] if
    /// the background task ended without reporting.
    pub async fn wait(self) -> Result<T, DownloadError> {
        match self.slot {
            Slot::Ready(result) => result,
            Slot::Pending(receiver) => receiver
                .await
                .unwrap_or_else(|_| Err(DownloadError::task_aborted(self.source.as_str()))),
        }
    }
}

impl<T> std::fmt::Debug for TransferHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.slot {
            Slot::Pending(_) => "pending",
            Slot::Ready(Ok(_)) => "succeeded",
            Slot::Ready(Err(_)) => "failed",
        };
        f.debug_struct("TransferHandle")
            .field("source", &self.source.as_str())
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn handle() -> (
        oneshot::Sender<Result<u32, DownloadError>>,
        TransferHandle<u32>,
    ) {
        let (tx, rx) = oneshot::channel();
        let source = Url::parse("https://example.com/f").unwrap();
        (tx, TransferHandle::new(source, rx))
    }

    #[test]
    fn test_poll_returns_none_while_pending() {
        let (_tx, mut handle) = handle();
        assert!(handle.poll_result().is_none());
        assert!(!handle.is_finished());
        assert!(handle.error().is_none());
    }

    #[test]
    fn test_poll_keeps_result_after_arrival() {
        let (tx, mut handle) = handle();
        tx.send(Ok(7)).unwrap();

        assert!(matches!(handle.poll_result(), Some(Ok(7))));
        assert!(matches!(handle.poll_result(), Some(Ok(7))));
        assert!(handle.error().is_none());
    }

    #[test]
    fn test_error_exposes_captured_failure() {
        let (tx, mut handle) = handle();
        tx.send(Err(DownloadError::http_status("https://example.com/f", 503)))
            .unwrap();

        let error = handle.error().unwrap();
        assert!(matches!(error, DownloadError::HttpStatus { status: 503, .. }));
    }

    #[test]
    fn test_dropped_sender_reports_task_aborted() {
        let (tx, mut handle) = handle();
        drop(tx);

        assert!(matches!(
            handle.error(),
            Some(DownloadError::TaskAborted { .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_returns_result() {
        let (tx, handle) = handle();
        tx.send(Ok(42)).unwrap();
        assert_eq!(handle.wait().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_wait_after_poll_returns_cached_result() {
        let (tx, mut handle) = handle();
        tx.send(Ok(1)).unwrap();
        assert!(handle.is_finished());
        assert_eq!(handle.wait().await.unwrap(), 1);
    }

    #[test]
    fn test_debug_shows_state() {
        let (_tx, handle) = handle();
        assert!(format!("{handle:?}").contains("pending"));
    }
}
