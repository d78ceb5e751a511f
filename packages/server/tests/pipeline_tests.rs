//! End-to-end pipeline: enqueue → worker loop → terminal status.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::harness;
use server_core::domains::provisioning::{Orchestrator, ProvisioningRequest};
use server_core::kernel::jobs::{
    InMemoryJobStore, JobQueue, JobRunner, JobRunnerConfig, JobStatusReport, ReportedStatus,
    RetryPolicy, StatusService,
};
use server_core::kernel::WebhookNotifier;
use uuid::Uuid;

struct Pipeline {
    queue: Arc<JobQueue>,
    status: Arc<StatusService>,
    runner: JobRunner,
}

fn pipeline(
    h: &common::TestHarness,
    policy: RetryPolicy,
    webhook_endpoint: Option<String>,
) -> Pipeline {
    let store = Arc::new(InMemoryJobStore::new());
    let queue = Arc::new(JobQueue::new(store.clone(), policy));
    let status = Arc::new(StatusService::new(store));
    let orchestrator = Arc::new(Orchestrator::new(h.deps.clone()));
    let notifier = Arc::new(WebhookNotifier::new(webhook_endpoint).unwrap());

    let mut config = JobRunnerConfig::with_worker_id("test-worker");
    config.poll_interval = Duration::from_millis(10);

    let runner = JobRunner::with_config(queue.clone(), orchestrator, notifier, config);
    Pipeline {
        queue,
        status,
        runner,
    }
}

fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay_ms: 1,
    }
}

fn request() -> ProvisioningRequest {
    ProvisioningRequest {
        owner: "alice01".into(),
        message: "build a landing page".into(),
        description: "landing page".into(),
        app_name: None,
    }
}

/// Poll until the job reaches a terminal status or the deadline hits.
async fn wait_terminal(status: &StatusService, job_id: Uuid) -> JobStatusReport {
    for _ in 0..500 {
        let report = status.job_status(job_id).await.unwrap();
        if matches!(
            report.status,
            ReportedStatus::Completed | ReportedStatus::Failed
        ) {
            return report;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach a terminal status in time");
}

#[tokio::test]
async fn job_completes_on_first_attempt() {
    let h = harness();
    let p = pipeline(&h, fast_retries(), None);
    let shutdown = p.runner.shutdown_handle();
    tokio::spawn(p.runner.run());

    let job = p.queue.enqueue(&request()).await.unwrap();
    let report = wait_terminal(&p.status, job.id).await;

    assert_eq!(report.status, ReportedStatus::Completed);
    assert_eq!(report.progress, 100);
    assert_eq!(report.attempt, 1);
    let result = report.result.unwrap();
    assert_eq!(result["urls"]["primaryUrl"], "https://alice01.trady.finance");

    shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let h = harness();
    // First two API calls return 503: attempts 1 and 2 fail at
    // project creation, attempt 3 runs the full pipeline.
    h.generation.fail_next(2).await;

    let p = pipeline(&h, fast_retries(), None);
    let shutdown = p.runner.shutdown_handle();
    tokio::spawn(p.runner.run());

    let job = p.queue.enqueue(&request()).await.unwrap();
    let report = wait_terminal(&p.status, job.id).await;

    assert_eq!(report.status, ReportedStatus::Completed);
    assert_eq!(report.attempt, 3);
    assert_eq!(h.generation.create_project_calls().await, 1);

    let stats = p.status.queue_stats().await.unwrap();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 0);

    shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
}

#[tokio::test]
async fn attempts_exhausted_keeps_last_error() {
    let h = harness();
    // More outages than the job has attempts.
    h.generation.fail_next(10).await;

    let p = pipeline(&h, fast_retries(), None);
    let shutdown = p.runner.shutdown_handle();
    tokio::spawn(p.runner.run());

    let job = p.queue.enqueue(&request()).await.unwrap();
    let report = wait_terminal(&p.status, job.id).await;

    assert_eq!(report.status, ReportedStatus::Failed);
    assert_eq!(report.attempt, 3);
    assert!(report.error.unwrap().contains("503"));

    shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let h = harness();
    h.generation.set_chats_versionless().await;

    let p = pipeline(&h, fast_retries(), None);
    let shutdown = p.runner.shutdown_handle();
    tokio::spawn(p.runner.run());

    let job = p.queue.enqueue(&request()).await.unwrap();
    let report = wait_terminal(&p.status, job.id).await;

    assert_eq!(report.status, ReportedStatus::Failed);
    assert_eq!(report.attempt, 1);
    assert!(report.error.unwrap().contains("no generated version"));
    // The project from the failed run is still reusable next time.
    assert_eq!(h.generation.create_project_calls().await, 1);

    shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
}

#[tokio::test]
async fn unreachable_webhook_endpoint_does_not_affect_the_job() {
    let h = harness();
    // Nothing listens here; delivery fails and is dropped.
    let p = pipeline(
        &h,
        fast_retries(),
        Some("http://127.0.0.1:9/webhook".to_string()),
    );
    let shutdown = p.runner.shutdown_handle();
    tokio::spawn(p.runner.run());

    let job = p.queue.enqueue(&request()).await.unwrap();
    let report = wait_terminal(&p.status, job.id).await;

    assert_eq!(report.status, ReportedStatus::Completed);

    shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
}
