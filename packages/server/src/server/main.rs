// Main entry point for the provisioning API server

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server_core::domains::provisioning::{Orchestrator, PostgresProvisioningStore};
use server_core::kernel::jobs::{
    JobQueue, JobRunner, JobRunnerConfig, PostgresJobStore, RetryPolicy, StatusService,
};
use server_core::kernel::{ServerDeps, V0Adapter, VercelAdapter, WebhookNotifier};
use server_core::server::{build_app, AppState};
use server_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting web provisioning API");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // External API clients
    let v0 = Arc::new(v0_client::V0Client::new(config.v0_api_key.as_str()).context("v0 client")?);
    let vercel = Arc::new(
        vercel_client::VercelClient::new(config.vercel_api_key.as_str())
            .context("Vercel client")?,
    );

    // Storage
    let provisioning_store = Arc::new(PostgresProvisioningStore::new(pool.clone()));
    let job_store = Arc::new(PostgresJobStore::new(pool.clone()));

    let deps = Arc::new(ServerDeps::new(
        provisioning_store,
        Arc::new(V0Adapter::new(v0)),
        Arc::new(VercelAdapter::new(vercel)),
        config.domain_suffix.clone(),
    ));

    let queue = Arc::new(JobQueue::new(
        job_store.clone(),
        RetryPolicy {
            max_attempts: config.max_job_attempts,
            base_delay_ms: config.retry_base_delay_ms as i64,
        },
    ));
    let status = Arc::new(StatusService::new(job_store));
    let orchestrator = Arc::new(Orchestrator::new(deps));
    let notifier = Arc::new(WebhookNotifier::new(config.webhook_url.clone())?);

    // Spawn worker loops
    let mut shutdown_handles = Vec::with_capacity(config.worker_count);
    for i in 0..config.worker_count {
        let runner = JobRunner::with_config(
            queue.clone(),
            orchestrator.clone(),
            notifier.clone(),
            JobRunnerConfig::with_worker_id(format!("worker-{i}")),
        );
        shutdown_handles.push(runner.shutdown_handle());
        tokio::spawn(async move {
            if let Err(e) = runner.run().await {
                tracing::error!(error = %e, "job runner exited with error");
            }
        });
    }
    tracing::info!(worker_count = config.worker_count, "job runners started");

    // Flip every worker's shutdown flag on Ctrl+C
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal");
        for handle in &shutdown_handles {
            handle.store(true, Ordering::SeqCst);
        }
    });

    let app = build_app(AppState { queue, status });

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
