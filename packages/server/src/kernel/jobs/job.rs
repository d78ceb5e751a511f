//! Job model for background provisioning execution.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::domains::provisioning::ProvisioningRequest;

/// Default attempt cap per job.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

// ============================================================================
// Enums
// ============================================================================

/// Job lifecycle. Transitions are monotonic:
/// queued → active → completed | failed, with stalled as a claimable
/// detour for active jobs whose worker stopped reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Active,
    Completed,
    Failed,
    Stalled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Active => "active",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Stalled => "stalled",
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ErrorKind {
    /// Transient error - will retry if attempts remain
    #[default]
    Retryable,
    /// Permanent error - will not retry
    NonRetryable,
}

impl ErrorKind {
    /// Whether this error kind should trigger a retry
    pub fn should_retry(&self) -> bool {
        matches!(self, ErrorKind::Retryable)
    }
}

// ============================================================================
// Job Model
// ============================================================================

/// A queued provisioning request with its execution bookkeeping.
///
/// Owned exclusively by the queue; workers mutate it only through the
/// queue's reporting interface.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Job {
    #[builder(default = Uuid::now_v7())]
    pub id: Uuid,

    /// Serialized [`ProvisioningRequest`].
    pub payload: serde_json::Value,

    // State
    #[builder(default)]
    pub status: JobStatus,
    /// 0–100; non-decreasing within one attempt, reset on claim.
    #[builder(default = 0)]
    pub progress: i16,
    #[builder(default = 1)]
    pub attempt: i32,
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: i32,

    // Scheduling and lease management
    #[builder(default, setter(strip_option))]
    pub run_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub lease_expires_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub worker_id: Option<String>,

    // Terminal payloads
    #[builder(default, setter(strip_option))]
    pub result: Option<serde_json::Value>,
    #[builder(default, setter(strip_option))]
    pub error_message: Option<String>,

    // Timestamps
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a queued job for a provisioning request.
    pub fn for_request(request: &ProvisioningRequest, max_attempts: i32) -> Result<Self> {
        let payload = serde_json::to_value(request)?;
        Ok(Self::builder()
            .payload(payload)
            .max_attempts(max_attempts)
            .build())
    }

    /// Deserialize the provisioning request payload.
    pub fn request(&self) -> Result<ProvisioningRequest> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| anyhow!("job {} has an invalid payload: {}", self.id, e))
    }

    /// Whether the job can be claimed at `now`.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        if !matches!(self.status, JobStatus::Queued | JobStatus::Stalled) {
            return false;
        }
        match self.run_at {
            None => true,
            Some(run_at) => run_at <= now,
        }
    }
}
