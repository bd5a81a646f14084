//! Error types for the download module.
//!
//! Every variant carries the locator (and path where relevant) it failed on,
//! so messages are useful without extra context from the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Broad failure classes a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any transfer was attempted (bad locator, no destination).
    InvalidInput,
    /// Connection, read, write or background-task failure during a transfer.
    Transport,
}

/// Errors that can occur while configuring or running a transfer.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The source locator is malformed or uses a scheme the transport can't fetch.
    #[error("invalid URL: {url} ({reason})")]
    InvalidUrl {
        /// The rejected locator text.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A file download was requested without a destination path.
    #[error("no destination path set for file download of {url}")]
    MissingDestination {
        /// The source locator.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, stream closed early, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The transport's timeout elapsed before the request completed.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while writing the destination.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be built from the supplied options.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// A background transfer ended without reporting a result.
    #[error("background transfer of {url} ended without a result")]
    TaskAborted {
        /// The source locator of the lost transfer.
        url: String,
    },
}

impl DownloadError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing destination error.
    pub fn missing_destination(url: impl Into<String>) -> Self {
        Self::MissingDestination { url: url.into() }
    }

    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a task-aborted error.
    pub fn task_aborted(url: impl Into<String>) -> Self {
        Self::TaskAborted { url: url.into() }
    }

    /// Classifies the error as invalid input or a transport failure.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidUrl { .. } | Self::MissingDestination { .. } => FailureKind::InvalidInput,
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::Io { .. }
            | Self::ClientBuild { .. }
            | Self::TaskAborted { .. } => FailureKind::Transport,
        }
    }

    /// Returns true when the error was raised before any transfer started.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        self.kind() == FailureKind::InvalidInput
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the url
// or path, which the source errors don't carry.
