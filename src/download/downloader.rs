//! The public entry point: one source, an optional destination, and the
//! listeners that narrate each transfer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, instrument};
use url::Url;

use super::client::HttpClient;
use super::constants::{DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};
use super::error::DownloadError;
use super::events::{
    DataCompletedEvent, EventKind, FileCompletedEvent, ProgressEvent, StringCompletedEvent,
};
use super::handle::TransferHandle;
use super::listeners::Listeners;
use super::request::{TransferRequest, parse_source};
use super::transfer::{FileTransfer, TransferJob};

/// Event-driven HTTP downloader.
///
/// Each call to a download method is an independent transfer with its own
/// result; nothing is stored on the downloader, so it can be reused freely.
/// Listeners run synchronously on whichever task performs the transfer, and a
/// listener that blocks stalls that transfer's read loop.
///
/// # Example
///
/// ```no_run
/// use webclient::Downloader;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut downloader = Downloader::new("https://example.com/file.bin")?
///     .with_destination("./file.bin");
/// downloader.on_progress(|event| {
///     if let Some(pct) = event.percentage {
///         println!("{pct:.1}%");
///     }
/// });
/// let transfer = downloader.download_file().await?;
/// println!("wrote {} bytes", transfer.bytes_written);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Downloader {
    request: TransferRequest,
    client: HttpClient,
    listeners: Arc<Listeners>,
    chunk_size: usize,
}

impl Downloader {
    /// Creates a downloader for `source` with a default [`HttpClient`].
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] immediately if `source` is not an
    /// absolute `http`/`https` URL.
    pub fn new(source: &str) -> Result<Self, DownloadError> {
        Ok(Self::from_request(
            TransferRequest::parse(source)?,
            HttpClient::new(),
        ))
    }

    /// Creates a downloader from an already validated request.
    #[must_use]
    pub fn from_request(request: TransferRequest, client: HttpClient) -> Self {
        Self {
            request,
            client,
            listeners: Arc::new(Listeners::default()),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the file path that file downloads write to.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.request.set_destination(Some(destination.into()));
        self
    }

    /// Replaces the HTTP client (for custom timeouts or User-Agent).
    #[must_use]
    pub fn with_client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    /// Sets how many bytes each progress event covers at most (minimum 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(MIN_CHUNK_SIZE);
        self
    }

    #[must_use]
    pub fn source(&self) -> &Url {
        self.request.source()
    }

    /// Replaces the source locator.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] and leaves the current source in
    /// place if `source` is malformed.
    pub fn set_source(&mut self, source: &str) -> Result<(), DownloadError> {
        self.request.set_source(parse_source(source)?);
        Ok(())
    }

    #[must_use]
    pub fn destination(&self) -> Option<&Path> {
        self.request.destination()
    }

    pub fn set_destination(&mut self, destination: Option<PathBuf>) {
        self.request.set_destination(destination);
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.count(kind)
    }

    /// Registers a listener for per-chunk (file) or per-line (string) progress.
    pub fn on_progress(
        &mut self,
        listener: impl Fn(&ProgressEvent) + Send + Sync + 'static,
    ) -> &mut Self {
        Arc::make_mut(&mut self.listeners).add_progress(listener);
        self
    }

    /// Registers a listener for the end of file transfers, successful or not.
    pub fn on_file_completed(
        &mut self,
        listener: impl Fn(&FileCompletedEvent) + Send + Sync + 'static,
    ) -> &mut Self {
        Arc::make_mut(&mut self.listeners).add_file_completed(listener);
        self
    }

    /// Registers a listener for the end of string transfers, successful or not.
    pub fn on_string_completed(
        &mut self,
        listener: impl Fn(&StringCompletedEvent) + Send + Sync + 'static,
    ) -> &mut Self {
        Arc::make_mut(&mut self.listeners).add_string_completed(listener);
        self
    }

    /// Registers a data-complete listener.
    ///
    /// The built-in transfers never emit this event; see
    /// [`Listeners::emit_data_completed`].
    pub fn on_data_completed(
        &mut self,
        listener: impl Fn(&DataCompletedEvent) + Send + Sync + 'static,
    ) -> &mut Self {
        Arc::make_mut(&mut self.listeners).add_data_completed(listener);
        self
    }

    /// Downloads the source into the destination file on the current task.
    ///
    /// Returns only after the file-complete listeners have run.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::MissingDestination`] if no destination is set
    ///   (no events are emitted).
    /// - Any transport failure, after the file-complete listeners observed it.
    pub async fn download_file(&self) -> Result<FileTransfer, DownloadError> {
        self.job().run_file().await
    }

    /// Downloads the source as text on the current task.
    ///
    /// # Errors
    ///
    /// Any transport failure, after the string-complete listeners observed
    /// the partial text.
    pub async fn download_string(&self) -> Result<String, DownloadError> {
        self.job().run_string().await
    }

    /// Starts [`download_file`](Self::download_file) on a new Tokio task and
    /// returns at once.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use = "the handle is the only way to observe the transfer's result"]
    #[instrument(skip(self), fields(url = %self.source()))]
    pub fn spawn_file_download(&self) -> TransferHandle<FileTransfer> {
        let job = self.job();
        spawn_job(self.source().clone(), async move { job.run_file().await })
    }

    /// Starts [`download_string`](Self::download_string) on a new Tokio task
    /// and returns at once.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use = "the handle is the only way to observe the transfer's result"]
    #[instrument(skip(self), fields(url = %self.source()))]
    pub fn spawn_string_download(&self) -> TransferHandle<String> {
        let job = self.job();
        spawn_job(self.source().clone(), async move { job.run_string().await })
    }

    fn job(&self) -> TransferJob {
        TransferJob {
            client: self.client.clone(),
            request: self.request.clone(),
            listeners: Arc::clone(&self.listeners),
            chunk_size: self.chunk_size,
        }
    }
}

fn spawn_job<T, F>(source: Url, transfer: F) -> TransferHandle<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T, DownloadError>> + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    tokio::spawn(async move {
        // The receiver may already be gone; the transfer still ran to completion.
        if sender.send(transfer.await).is_err() {
            debug!("transfer handle dropped before the result arrived");
        }
    });
    debug!("background transfer spawned");
    TransferHandle::new(source, receiver)
}
