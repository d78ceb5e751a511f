//! Provisioning error taxonomy.
//!
//! The orchestrator never retries internally; it only classifies.
//! Retry policy lives in the job queue, which consults
//! [`ProvisionError::kind`] to decide between requeue and terminal
//! failure.

use thiserror::Error;

use crate::kernel::jobs::ErrorKind;

/// Typed failure of a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Bad input (owner/domain). Permanent; surfaced to the submitter
    /// before enqueue where possible.
    #[error("{0}")]
    Validation(String),

    /// Transient remote or store failure (network, timeout, 5xx,
    /// store unavailability). Retried by the job queue.
    #[error("{0}")]
    Transient(String),

    /// Permanent remote failure (4xx, missing required fields). Not
    /// retried.
    #[error("{0}")]
    Permanent(String),
}

impl ProvisionError {
    /// Retry classification for the job queue.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::Transient(_) => ErrorKind::Retryable,
            ProvisionError::Validation(_) | ProvisionError::Permanent(_) => {
                ErrorKind::NonRetryable
            }
        }
    }

    /// Wrap a store failure; the store contract treats unavailability
    /// as retryable.
    pub fn store(err: impl std::fmt::Display) -> Self {
        ProvisionError::Transient(format!("provisioning store unavailable: {err}"))
    }
}

impl From<v0_client::V0Error> for ProvisionError {
    fn from(err: v0_client::V0Error) -> Self {
        if err.is_transient() {
            ProvisionError::Transient(err.to_string())
        } else {
            ProvisionError::Permanent(err.to_string())
        }
    }
}

impl From<vercel_client::VercelError> for ProvisionError {
    fn from(err: vercel_client::VercelError) -> Self {
        if err.is_transient() {
            ProvisionError::Transient(err.to_string())
        } else {
            ProvisionError::Permanent(err.to_string())
        }
    }
}
