//! Job queue: the single owner of retry policy.
//!
//! Workers report outcomes; the queue decides whether a failure is
//! retried (with exponential backoff) or terminal. The store below it
//! only records transitions.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domains::provisioning::{domain_label, sanitize_owner, ProvisioningRequest};

use super::job::{ErrorKind, Job, DEFAULT_MAX_ATTEMPTS};
use super::store::{JobStore, StatusCounts};

/// Lease granted on claim and renewed on each progress report.
const DEFAULT_LEASE_MS: i64 = 60_000;

/// Upper bound on a single retry delay.
const MAX_BACKOFF_MS: i64 = 3_600_000;

/// Retry configuration applied to every job.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: i32,
    pub base_delay_ms: i64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows `failed_attempt`:
    /// `base * 2^(failed_attempt - 1)`, capped at one hour.
    pub fn backoff_ms(&self, failed_attempt: i32) -> i64 {
        let exponent = (failed_attempt - 1).clamp(0, 30) as u32;
        self.base_delay_ms
            .saturating_mul(1_i64 << exponent)
            .min(MAX_BACKOFF_MS)
    }
}

/// Why a submission was rejected at the door.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    /// Input failed validation; the submitter must fix the request.
    #[error("{0}")]
    Invalid(String),
    /// The queue could not persist the job.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// What the queue decided about a reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Requeued for another attempt at `run_at`.
    Retrying { run_at: chrono::DateTime<Utc> },
    /// Attempts exhausted or error not retryable; job is terminal.
    Failed,
}

pub struct JobQueue {
    store: Arc<dyn JobStore>,
    policy: RetryPolicy,
    lease_ms: i64,
}

impl JobQueue {
    pub fn new(store: Arc<dyn JobStore>, policy: RetryPolicy) -> Self {
        Self {
            store,
            policy,
            lease_ms: DEFAULT_LEASE_MS,
        }
    }

    /// Validate and enqueue a provisioning request.
    ///
    /// Owner and domain-label validation runs here so submitters get
    /// a synchronous rejection instead of a queued job doomed to fail.
    pub async fn enqueue(&self, request: &ProvisioningRequest) -> Result<Job, EnqueueError> {
        let owner =
            sanitize_owner(&request.owner).map_err(|e| EnqueueError::Invalid(e.to_string()))?;
        domain_label(&owner, request.app_name.as_deref())
            .map_err(|e| EnqueueError::Invalid(e.to_string()))?;

        let job = Job::for_request(request, self.policy.max_attempts)?;
        self.store.insert(&job).await?;

        info!(job_id = %job.id, owner = %owner, "provisioning job enqueued");
        Ok(job)
    }

    /// Claim up to `limit` ready jobs for a worker.
    pub async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<Job>> {
        self.store.claim_ready(worker_id, limit, self.lease_ms).await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Job>> {
        self.store.find_by_id(id).await
    }

    /// Record progress (clamped to 0..=100) and renew the lease.
    pub async fn report_progress(&self, id: Uuid, progress: i16) -> Result<()> {
        let progress = progress.clamp(0, 100);
        self.store.record_progress(id, progress, self.lease_ms).await
    }

    /// active → completed with a result payload.
    pub async fn mark_succeeded(&self, id: Uuid, result: Value) -> Result<()> {
        self.store.complete(id, result).await?;
        info!(job_id = %id, "job completed");
        Ok(())
    }

    /// Apply retry policy to a reported failure.
    pub async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        kind: ErrorKind,
    ) -> Result<FailureDisposition> {
        let job = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("job {id} not found"))?;

        if kind.should_retry() && job.attempt < job.max_attempts {
            let delay = self.policy.backoff_ms(job.attempt);
            let run_at = Utc::now() + Duration::milliseconds(delay);
            self.store.requeue(id, run_at, error).await?;
            warn!(
                job_id = %id,
                attempt = job.attempt,
                delay_ms = delay,
                error = %error,
                "job failed, retrying"
            );
            Ok(FailureDisposition::Retrying { run_at })
        } else {
            self.store.fail(id, error).await?;
            warn!(
                job_id = %id,
                attempt = job.attempt,
                error = %error,
                "job failed permanently"
            );
            Ok(FailureDisposition::Failed)
        }
    }

    /// Reclaim active jobs whose lease expired. Jobs with attempts
    /// remaining become stalled (claimable immediately); the rest are
    /// failed. Returns the jobs that became terminal, so the caller
    /// can notify.
    pub async fn recover_stalled(&self) -> Result<Vec<Job>> {
        let expired = self.store.find_expired_leases(Utc::now()).await?;
        let mut failed = Vec::new();

        for job in expired {
            if job.attempt < job.max_attempts {
                self.store.mark_stalled(job.id).await?;
                warn!(job_id = %job.id, attempt = job.attempt, "stalled job requeued");
            } else {
                self.store
                    .fail(job.id, "job stalled: worker stopped reporting progress")
                    .await?;
                warn!(job_id = %job.id, "stalled job failed, attempts exhausted");
                if let Some(job) = self.store.find_by_id(job.id).await? {
                    failed.push(job);
                }
            }
        }
        Ok(failed)
    }

    pub async fn counts(&self) -> Result<StatusCounts> {
        self.store.counts().await
    }
}
