//! Durable job queue for provisioning requests.
//!
//! - `job`: the job model and its lifecycle states
//! - `store`: atomic persistence of status transitions
//! - `queue`: retry policy, backoff, and stalled-job recovery
//! - `status`: external status and stats reporting
//! - `runner`: worker loops executing the orchestrator

pub mod job;
pub mod queue;
pub mod runner;
pub mod status;
pub mod store;

pub use job::{ErrorKind, Job, JobStatus, DEFAULT_MAX_ATTEMPTS};
pub use queue::{EnqueueError, FailureDisposition, JobQueue, RetryPolicy};
pub use runner::{JobRunner, JobRunnerConfig};
pub use status::{JobStatusReport, QueueStats, ReportedStatus, StatusService};
pub use store::{InMemoryJobStore, JobStore, PostgresJobStore, StatusCounts};
