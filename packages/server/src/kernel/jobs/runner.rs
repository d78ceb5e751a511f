//! Background worker loop for provisioning jobs.
//!
//! Each `JobRunner` polls the queue for ready jobs, drives the
//! provisioning orchestrator, and reports the outcome back to the
//! queue. Retry decisions stay in the queue; the runner only passes
//! along the error classification. Terminal transitions fire a
//! best-effort webhook notification off the worker loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domains::provisioning::{Orchestrator, ProgressSink};
use crate::kernel::webhook::{WebhookEvent, WebhookNotifier};

use super::job::{ErrorKind, Job};
use super::queue::{FailureDisposition, JobQueue};

/// Configuration for one worker loop.
#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    /// Maximum number of jobs to claim at once
    pub batch_size: i64,
    /// How long to wait when no jobs are available
    pub poll_interval: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            poll_interval: Duration::from_secs(2),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl JobRunnerConfig {
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// Reports orchestrator progress into the queue, which also renews
/// the job's lease. Report failures are logged and ignored; losing a
/// progress update must not fail the job.
struct QueueProgress {
    queue: Arc<JobQueue>,
    job_id: Uuid,
}

#[async_trait]
impl ProgressSink for QueueProgress {
    async fn report(&self, progress: i16) {
        if let Err(e) = self.queue.report_progress(self.job_id, progress).await {
            warn!(job_id = %self.job_id, error = %e, "failed to record progress");
        }
    }
}

/// Background service that executes provisioning jobs.
pub struct JobRunner {
    queue: Arc<JobQueue>,
    orchestrator: Arc<Orchestrator>,
    notifier: Arc<WebhookNotifier>,
    config: JobRunnerConfig,
    shutdown: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(
        queue: Arc<JobQueue>,
        orchestrator: Arc<Orchestrator>,
        notifier: Arc<WebhookNotifier>,
    ) -> Self {
        Self::with_config(queue, orchestrator, notifier, JobRunnerConfig::default())
    }

    pub fn with_config(
        queue: Arc<JobQueue>,
        orchestrator: Arc<Orchestrator>,
        notifier: Arc<WebhookNotifier>,
        config: JobRunnerConfig,
    ) -> Self {
        Self {
            queue,
            orchestrator,
            notifier,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shutdown handle shared with whoever supervises this runner.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Run the worker loop until shutdown is requested.
    pub async fn run(self) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "job runner starting"
        );

        loop {
            if self.is_shutdown_requested() {
                break;
            }

            self.sweep_stalled().await;

            let jobs = match self
                .queue
                .claim(&self.config.worker_id, self.config.batch_size)
                .await
            {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!(error = %e, "failed to claim jobs");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            if jobs.is_empty() {
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }

            debug!(count = jobs.len(), "claimed jobs");

            for job in jobs {
                if self.is_shutdown_requested() {
                    break;
                }
                self.execute(job).await;
            }
        }

        info!(worker_id = %self.config.worker_id, "job runner stopped");
        Ok(())
    }

    /// Run until a Ctrl+C signal flips the shutdown flag.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = self.shutdown_handle();

        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
            shutdown.store(true, Ordering::SeqCst);
        });

        self.run().await
    }

    /// Execute one claimed job and report its outcome.
    pub async fn execute(&self, job: Job) {
        let job_id = job.id;
        debug!(job_id = %job_id, attempt = job.attempt, "executing job");

        let request = match job.request() {
            Ok(request) => request,
            Err(e) => {
                // A payload that no longer deserializes will never
                // succeed on retry.
                error!(job_id = %job_id, error = %e, "invalid job payload");
                self.report_failure(job_id, &e.to_string(), ErrorKind::NonRetryable)
                    .await;
                return;
            }
        };

        let progress = QueueProgress {
            queue: self.queue.clone(),
            job_id,
        };

        match self.orchestrator.provision(&request, &progress).await {
            Ok(outcome) => {
                info!(job_id = %job_id, "job succeeded");
                match serde_json::to_value(&outcome) {
                    Ok(result) => {
                        if let Err(e) = self.queue.mark_succeeded(job_id, result.clone()).await {
                            error!(job_id = %job_id, error = %e, "failed to mark job succeeded");
                            return;
                        }
                        self.dispatch(WebhookEvent::completed(job_id, result));
                    }
                    Err(e) => {
                        error!(job_id = %job_id, error = %e, "failed to serialize job result");
                        self.report_failure(job_id, &e.to_string(), ErrorKind::NonRetryable)
                            .await;
                    }
                }
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "job failed");
                self.report_failure(job_id, &e.to_string(), e.kind()).await;
            }
        }
    }

    async fn report_failure(&self, job_id: Uuid, error: &str, kind: ErrorKind) {
        match self.queue.mark_failed(job_id, error, kind).await {
            Ok(FailureDisposition::Failed) => {
                self.dispatch(WebhookEvent::failed(job_id, error));
            }
            Ok(FailureDisposition::Retrying { .. }) => {}
            Err(e) => {
                error!(job_id = %job_id, error = %e, "failed to mark job failed");
            }
        }
    }

    /// Reclaim jobs whose worker stopped reporting, and notify for
    /// the ones that exhausted their attempts.
    async fn sweep_stalled(&self) {
        match self.queue.recover_stalled().await {
            Ok(failed) => {
                for job in failed {
                    let error = job
                        .error_message
                        .unwrap_or_else(|| "job stalled".to_string());
                    self.dispatch(WebhookEvent::failed(job.id, error));
                }
            }
            Err(e) => {
                error!(error = %e, "stalled job sweep failed");
            }
        }
    }

    /// Fire a webhook off the worker loop; delivery never blocks or
    /// fails job processing.
    fn dispatch(&self, event: WebhookEvent) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            notifier.notify(&event).await;
        });
    }
}
