//! Webclient Library
//!
//! A small event-driven HTTP download helper: fetch a URL into a file or a
//! string, with progress callbacks as bytes arrive and a completion callback
//! when the transfer ends.
//!
//! # Architecture
//!
//! - [`download`] - Downloader, listener registry, transfer loops and handles
//!
//! The CLI binary (`webclient`) is a thin wrapper over [`Downloader`].

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
mod user_agent;

// Re-export commonly used types
pub use download::{
    ClientOptions, DEFAULT_CHUNK_SIZE, DownloadError, Downloader, EventKind, FailureKind,
    FileCompletedEvent, FileTransfer, HttpClient, ProgressEvent, StringCompletedEvent,
    TransferHandle, TransferOutcome,
};
