//! HTTP client wrapper used by every transfer.
//!
//! Owns the `reqwest::Client` and turns transport failures and error status
//! codes into [`DownloadError`]s.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use crate::user_agent::default_user_agent;

/// Transport settings.
///
/// The defaults set no explicit deadline, so a transfer waits as long as the
/// transport lets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Limit on establishing the TCP/TLS connection.
    pub connect_timeout: Option<Duration>,
    /// Limit on each read from the response body.
    pub read_timeout: Option<Duration>,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

/// HTTP client for issuing transfer requests.
///
/// Cheap to clone; clones share the underlying connection state.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with [`ClientOptions::default`].
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_options(&ClientOptions::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if reqwest rejects the options
    /// (for example, an invalid header value in `user_agent`).
    #[instrument(level = "debug")]
    pub fn with_options(options: &ClientOptions) -> Result<Self, DownloadError> {
        let client = client_builder(options)
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Issues a GET and returns the response once a success status arrives.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`]/[`DownloadError::Timeout`] when the
    /// request can't be sent, and [`DownloadError::HttpStatus`] for any
    /// non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &Url) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
        }

        debug!(
            status = status.as_u16(),
            content_length = ?response.content_length(),
            "response headers received"
        );
        Ok(response)
    }
}

fn client_builder(options: &ClientOptions) -> ClientBuilder {
    let mut builder = Client::builder()
        .gzip(true)
        .user_agent(options.user_agent.clone());
    if let Some(timeout) = options.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = options.read_timeout {
        builder = builder.read_timeout(timeout);
    }
    builder
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_have_no_deadline() {
        let options = ClientOptions::default();
        assert!(options.connect_timeout.is_none());
        assert!(options.read_timeout.is_none());
        assert!(options.user_agent.starts_with("webclient/"));
    }

    #[test]
    fn test_with_options_accepts_timeouts() {
        let options = ClientOptions {
            connect_timeout: Some(Duration::from_secs(5)),
            read_timeout: Some(Duration::from_secs(30)),
            ..ClientOptions::default()
        };
        assert!(HttpClient::with_options(&options).is_ok());
    }

    #[test]
    fn test_with_options_rejects_invalid_user_agent() {
        let options = ClientOptions {
            user_agent: "bad\nagent".to_string(),
            ..ClientOptions::default()
        };
        let result = HttpClient::with_options(&options);
        assert!(
            matches!(result, Err(DownloadError::ClientBuild { .. })),
            "Expected ClientBuild, got: {result:?}"
        );
    }
}
