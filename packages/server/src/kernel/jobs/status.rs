//! Read-side status reporting for jobs and the queue.
//!
//! External observers never see internal bookkeeping states: stalled
//! jobs report (and count) as queued, since they are waiting to run
//! again.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::job::{Job, JobStatus};
use super::store::JobStore;

/// Externally visible job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportedStatus {
    Queued,
    Active,
    Completed,
    Failed,
    NotFound,
}

impl From<JobStatus> for ReportedStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Queued | JobStatus::Stalled => ReportedStatus::Queued,
            JobStatus::Active => ReportedStatus::Active,
            JobStatus::Completed => ReportedStatus::Completed,
            JobStatus::Failed => ReportedStatus::Failed,
        }
    }
}

/// Point-in-time view of one job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusReport {
    pub job_id: Uuid,
    pub status: ReportedStatus,
    pub progress: i16,
    pub attempt: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusReport {
    pub fn not_found(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: ReportedStatus::NotFound,
            progress: 0,
            attempt: 0,
            result: None,
            error: None,
        }
    }

    fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status.into(),
            progress: job.progress,
            attempt: job.attempt,
            result: job.result.clone(),
            error: job.error_message.clone(),
        }
    }
}

/// Aggregate queue counters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueueStats {
    pub waiting: i64,
    pub active: i64,
    pub completed: i64,
    pub failed: i64,
}

/// Read-only query surface over the job store.
pub struct StatusService {
    store: Arc<dyn JobStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Status of one job. Unknown ids report `not_found` rather than
    /// erroring.
    pub async fn job_status(&self, job_id: Uuid) -> Result<JobStatusReport> {
        let report = match self.store.find_by_id(job_id).await? {
            Some(job) => JobStatusReport::from_job(&job),
            None => JobStatusReport::not_found(job_id),
        };
        Ok(report)
    }

    pub async fn queue_stats(&self) -> Result<QueueStats> {
        let counts = self.store.counts().await?;
        Ok(QueueStats {
            waiting: counts.queued + counts.stalled,
            active: counts.active,
            completed: counts.completed,
            failed: counts.failed,
        })
    }
}
