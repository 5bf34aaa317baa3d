//! HTTP client configuration and building logic

use std::time::Duration;

use reqwest::Client;

use crate::constants::http;
use crate::errors::{DownloadError, DownloadResult};

/// Configuration for the download HTTP client
///
/// Response bodies are never transparently decompressed, so a `.gz` file
/// arrives byte-for-byte as published and its checksum can be verified.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Overall request timeout (None = wait indefinitely)
    pub request_timeout: Option<Duration>,
    /// Connect timeout
    pub connect_timeout: Option<Duration>,
    /// User agent sent with every request
    pub user_agent: String,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            connect_timeout: Some(http::CONNECT_TIMEOUT),
            user_agent: http::USER_AGENT.to_string(),
            tcp_nodelay: true,
        }
    }
}

impl ClientConfig {
    /// Set the overall request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> DownloadResult<Client> {
        let mut client_builder = Client::builder()
            .user_agent(self.user_agent.as_str())
            .tcp_nodelay(self.tcp_nodelay);

        if let Some(timeout) = self.request_timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(timeout) = self.connect_timeout {
            client_builder = client_builder.connect_timeout(timeout);
        }

        client_builder.build().map_err(DownloadError::Http)
    }
}
