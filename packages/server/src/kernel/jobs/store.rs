//! Job persistence.
//!
//! [`JobStore`] is the durability seam: every status transition is a
//! single atomic store operation, so concurrent workers cannot
//! observe or produce torn state. Retry policy does NOT live here:
//! the queue decides, the store records.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::job::{Job, JobStatus};

/// Per-status job counts; best-effort snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCounts {
    pub queued: i64,
    pub active: i64,
    pub completed: i64,
    pub failed: i64,
    pub stalled: i64,
}

/// Storage contract for jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: &Job) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>>;

    /// Atomically claim up to `limit` ready jobs (queued or stalled,
    /// due to run): transition to active, reset progress, take a
    /// lease. No two workers can claim the same job.
    async fn claim_ready(&self, worker_id: &str, limit: i64, lease_ms: i64) -> Result<Vec<Job>>;

    /// Record progress for an active job and extend its lease.
    /// Progress never decreases within an attempt.
    async fn record_progress(&self, id: Uuid, progress: i16, lease_ms: i64) -> Result<()>;

    /// active → completed, storing the result payload.
    async fn complete(&self, id: Uuid, result: Value) -> Result<()>;

    /// active → queued for a retry at `run_at`: attempt incremented,
    /// progress reset, lease released, last error retained.
    async fn requeue(&self, id: Uuid, run_at: DateTime<Utc>, error: &str) -> Result<()>;

    /// active → stalled (lease expired): attempt incremented,
    /// progress reset, immediately claimable.
    async fn mark_stalled(&self, id: Uuid) -> Result<()>;

    /// → failed, storing the error message. Terminal.
    async fn fail(&self, id: Uuid, error: &str) -> Result<()>;

    /// Active jobs whose lease expired before `now`.
    async fn find_expired_leases(&self, now: DateTime<Utc>) -> Result<Vec<Job>>;

    async fn counts(&self) -> Result<StatusCounts>;
}

const JOB_COLUMNS: &str = "id, payload, status, progress, attempt, max_attempts, run_at, \
                           lease_expires_at, worker_id, result, error_message, created_at, \
                           updated_at";

/// PostgreSQL-backed job store.
pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, payload, status, progress, attempt, max_attempts, run_at,
                lease_expires_at, worker_id, result, error_message, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(job.id)
        .bind(&job.payload)
        .bind(job.status)
        .bind(job.progress)
        .bind(job.attempt)
        .bind(job.max_attempts)
        .bind(job.run_at)
        .bind(job.lease_expires_at)
        .bind(&job.worker_id)
        .bind(&job.result)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn claim_ready(&self, worker_id: &str, limit: i64, lease_ms: i64) -> Result<Vec<Job>> {
        // FOR UPDATE SKIP LOCKED keeps concurrent claimers from
        // blocking on or double-claiming the same rows.
        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            WITH next_jobs AS (
                SELECT id
                FROM jobs
                WHERE status IN ('queued', 'stalled')
                  AND (run_at IS NULL OR run_at <= NOW())
                ORDER BY COALESCE(run_at, created_at)
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE jobs
            SET
                status = 'active',
                progress = 0,
                worker_id = $3,
                lease_expires_at = NOW() + ($2 || ' milliseconds')::INTERVAL,
                updated_at = NOW()
            WHERE id IN (SELECT id FROM next_jobs)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(limit)
        .bind(lease_ms.to_string())
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn record_progress(&self, id: Uuid, progress: i16, lease_ms: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET progress = GREATEST(progress, $2),
                lease_expires_at = NOW() + ($3 || ' milliseconds')::INTERVAL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(progress)
        .bind(lease_ms.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn complete(&self, id: Uuid, result: Value) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed',
                progress = 100,
                result = $2,
                lease_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(result)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn requeue(&self, id: Uuid, run_at: DateTime<Utc>, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'queued',
                attempt = attempt + 1,
                progress = 0,
                run_at = $2,
                error_message = $3,
                lease_expires_at = NULL,
                worker_id = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(run_at)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_stalled(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'stalled',
                attempt = attempt + 1,
                progress = 0,
                run_at = NOW(),
                lease_expires_at = NULL,
                worker_id = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed',
                error_message = $2,
                lease_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_expired_leases(&self, now: DateTime<Utc>) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'active' AND lease_expires_at < $1"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn counts(&self) -> Result<StatusCounts> {
        let rows = sqlx::query_as::<_, (JobStatus, i64)>(
            "SELECT status, COUNT(*) FROM jobs GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            match status {
                JobStatus::Queued => counts.queued = count,
                JobStatus::Active => counts.active = count,
                JobStatus::Completed => counts.completed = count,
                JobStatus::Failed => counts.failed = count,
                JobStatus::Stalled => counts.stalled = count,
            }
        }
        Ok(counts)
    }
}

/// In-memory job store for tests and offline runs. Mirrors the
/// Postgres transition guards exactly.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move an active job's lease into the past. Test helper for
    /// exercising stalled-job recovery.
    pub async fn force_lease_expiry(&self, id: Uuid) {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.lease_expires_at = Some(Utc::now() - Duration::seconds(1));
        }
    }

    /// Move a job's `run_at` into the past so a scheduled retry is
    /// claimable immediately. Test helper.
    pub async fn make_due(&self, id: Uuid) {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.run_at = Some(Utc::now() - Duration::seconds(1));
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        self.jobs.lock().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.lock().await.get(&id).cloned())
    }

    async fn claim_ready(&self, worker_id: &str, limit: i64, lease_ms: i64) -> Result<Vec<Job>> {
        let mut jobs = self.jobs.lock().await;
        let now = Utc::now();

        let mut ready: Vec<(DateTime<Utc>, Uuid)> = jobs
            .values()
            .filter(|job| job.is_ready(now))
            .map(|job| (job.run_at.unwrap_or(job.created_at), job.id))
            .collect();
        ready.sort();
        ready.truncate(limit.max(0) as usize);
        let ready: Vec<Uuid> = ready.into_iter().map(|(_, id)| id).collect();

        let mut claimed = Vec::with_capacity(ready.len());
        for id in ready {
            if let Some(job) = jobs.get_mut(&id) {
                job.status = JobStatus::Active;
                job.progress = 0;
                job.worker_id = Some(worker_id.to_string());
                job.lease_expires_at = Some(now + Duration::milliseconds(lease_ms));
                job.updated_at = now;
                claimed.push(job.clone());
            }
        }
        Ok(claimed)
    }

    async fn record_progress(&self, id: Uuid, progress: i16, lease_ms: i64) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            if job.status == JobStatus::Active {
                job.progress = job.progress.max(progress);
                job.lease_expires_at = Some(Utc::now() + Duration::milliseconds(lease_ms));
                job.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn complete(&self, id: Uuid, result: Value) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            if job.status == JobStatus::Active {
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.result = Some(result);
                job.lease_expires_at = None;
                job.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn requeue(&self, id: Uuid, run_at: DateTime<Utc>, error: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            if job.status == JobStatus::Active {
                job.status = JobStatus::Queued;
                job.attempt += 1;
                job.progress = 0;
                job.run_at = Some(run_at);
                job.error_message = Some(error.to_string());
                job.lease_expires_at = None;
                job.worker_id = None;
                job.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn mark_stalled(&self, id: Uuid) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            if job.status == JobStatus::Active {
                job.status = JobStatus::Stalled;
                job.attempt += 1;
                job.progress = 0;
                job.run_at = Some(Utc::now());
                job.lease_expires_at = None;
                job.worker_id = None;
                job.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            if !job.status.is_terminal() {
                job.status = JobStatus::Failed;
                job.error_message = Some(error.to_string());
                job.lease_expires_at = None;
                job.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn find_expired_leases(&self, now: DateTime<Utc>) -> Result<Vec<Job>> {
        let jobs = self.jobs.lock().await;
        Ok(jobs
            .values()
            .filter(|job| {
                job.status == JobStatus::Active
                    && job.lease_expires_at.is_some_and(|lease| lease < now)
            })
            .cloned()
            .collect())
    }

    async fn counts(&self) -> Result<StatusCounts> {
        let jobs = self.jobs.lock().await;
        let mut counts = StatusCounts::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Active => counts.active += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
                JobStatus::Stalled => counts.stalled += 1,
            }
        }
        Ok(counts)
    }
}
