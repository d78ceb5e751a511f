//! Provisioning domain: turning a generation request into a live site.
//!
//! The [`Orchestrator`] drives the ordered pipeline (project → chat →
//! deployment → custom domain) against the external services, using
//! the [`ProvisioningStore`] to make every step idempotent across
//! retries and repeated submissions for the same owner.

pub mod error;
pub mod models;
pub mod orchestrator;
pub mod sanitize;
pub mod store;

pub use error::ProvisionError;
pub use models::{ProvisionOutcome, ProvisioningRecord, ProvisioningRequest};
pub use orchestrator::{NoProgress, Orchestrator, ProgressSink};
pub use sanitize::{domain_label, sanitize_owner};
pub use store::{InMemoryProvisioningStore, PostgresProvisioningStore, ProvisioningStore};
