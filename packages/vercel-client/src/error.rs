//! Error types for the Vercel client.

use thiserror::Error;

/// Result type for Vercel client operations.
pub type Result<T> = std::result::Result<T, VercelError>;

/// Vercel client errors.
#[derive(Debug, Error)]
pub enum VercelError {
    /// Configuration error (missing token, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response). 4xx covers malformed domains and
    /// domains already owned by another account.
    #[error("Vercel API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl VercelError {
    /// Whether the failure is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            VercelError::Network(_) => true,
            VercelError::Api { status, .. } => *status >= 500 || *status == 429,
            VercelError::Config(_) | VercelError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for VercelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VercelError::Parse(err.to_string())
        } else {
            VercelError::Network(err.to_string())
        }
    }
}
