//! HTTP error types

use std::time::Duration;

/// Failure to obtain a response at all; HTTP error statuses are not errors
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid header {0}")]
    InvalidHeader(String),

    #[error("No mock response available in offline mode for {method} {url}")]
    MockNotFound { method: String, url: String },
}

impl HttpError {
    /// Whether the request may have reached the server
    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::Transport(_) | HttpError::Timeout { .. })
    }
}
