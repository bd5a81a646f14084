//! Event-driven HTTP downloads with progress and completion callbacks.
//!
//! A [`Downloader`] fetches one source either into a file (streamed to disk in
//! fixed-size pieces) or into a `String` (read line by line), narrating the
//! transfer to registered listeners.
//!
//! # Features
//!
//! - Progress events per chunk/line, in read order, never concurrent
//! - Completion events that fire exactly once per transfer, even on failure
//! - Foreground (`download_*`) and background (`spawn_*`) variants
//! - Per-call results; background failures are captured in a [`TransferHandle`]
//!
//! # Example
//!
//! ```no_run
//! use webclient::download::Downloader;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut downloader = Downloader::new("https://example.com/notes.txt")?;
//! downloader.on_string_completed(|event| println!("{} chars", event.text.len()));
//! let text = downloader.download_string().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod downloader;
mod error;
mod events;
mod handle;
mod listeners;
mod request;
mod transfer;

pub use client::{ClientOptions, HttpClient};
pub use constants::{DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE, SUPPORTED_SCHEMES};
pub use downloader::Downloader;
pub use error::{DownloadError, FailureKind};
pub use events::{
    DataCompletedEvent, EventKind, FileCompletedEvent, ProgressEvent, StringCompletedEvent,
    TransferOutcome, percentage,
};
pub use handle::TransferHandle;
pub use listeners::{Listener, Listeners};
pub use request::TransferRequest;
pub use transfer::{FileTransfer, TransferPhase};
