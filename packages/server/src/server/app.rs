//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::jobs::{JobQueue, StatusService};
use crate::server::routes::{
    generate_handler, health_handler, job_status_handler, queue_stats_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<JobQueue>,
    pub status: Arc<StatusService>,
}

/// Build the Axum application router.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/web-generator/generate", post(generate_handler))
        .route("/api/web-generator/status/:job_id", get(job_status_handler))
        .route("/api/web-generator/queue/stats", get(queue_stats_handler))
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
