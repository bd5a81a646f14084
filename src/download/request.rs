//! Transfer request: the source locator and optional destination path.

use std::path::{Path, PathBuf};

use url::Url;

use super::constants::SUPPORTED_SCHEMES;
use super::error::DownloadError;

/// What to fetch and, for file downloads, where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    source: Url,
    destination: Option<PathBuf>,
}

impl TransferRequest {
    /// Parses a source locator into a request with no destination.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if `source` does not parse as an
    /// absolute URL or its scheme is not `http`/`https`.
    pub fn parse(source: &str) -> Result<Self, DownloadError> {
        Ok(Self {
            source: parse_source(source)?,
            destination: None,
        })
    }

    /// Sets the destination path for file downloads.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// The source locator.
    #[must_use]
    pub fn source(&self) -> &Url {
        &self.source
    }

    /// The destination path, absent for string transfers.
    #[must_use]
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub(crate) fn set_source(&mut self, source: Url) {
        self.source = source;
    }

    pub(crate) fn set_destination(&mut self, destination: Option<PathBuf>) {
        self.destination = destination;
    }
}

/// Validates a locator string.
pub(crate) fn parse_source(source: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(source.trim())
        .map_err(|e| DownloadError::invalid_url(source, e.to_string()))?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(DownloadError::invalid_url(
            source,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(DownloadError::invalid_url(source, "missing host"));
    }

    Ok(url)
}
