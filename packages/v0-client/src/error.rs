//! Error types for the v0 Platform client.

use thiserror::Error;

/// Result type for v0 client operations.
pub type Result<T> = std::result::Result<T, V0Error>;

/// v0 Platform client errors.
#[derive(Debug, Error)]
pub enum V0Error {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response)
    #[error("v0 API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl V0Error {
    /// Whether the failure is worth retrying.
    ///
    /// Network failures, timeouts, 5xx responses and rate limits are
    /// transient; every other API response is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            V0Error::Network(_) => true,
            V0Error::Api { status, .. } => *status >= 500 || *status == 429,
            V0Error::Config(_) | V0Error::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for V0Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            V0Error::Parse(err.to_string())
        } else {
            V0Error::Network(err.to_string())
        }
    }
}
