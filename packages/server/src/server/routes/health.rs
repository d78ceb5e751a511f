use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    queue: QueueHealth,
}

#[derive(Serialize)]
pub struct QueueHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Verifies the job store answers a stats query within 5 seconds,
/// which exercises the same storage path the workers depend on.
/// Returns 200 OK when healthy, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let queue_health = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state.status.queue_stats(),
    )
    .await
    {
        Ok(Ok(_)) => QueueHealth {
            status: "ok".to_string(),
            error: None,
        },
        Ok(Err(e)) => QueueHealth {
            status: "error".to_string(),
            error: Some(format!("Stats query failed: {}", e)),
        },
        Err(_) => QueueHealth {
            status: "error".to_string(),
            error: Some("Stats query timeout (>5s)".to_string()),
        },
    };

    let is_healthy = queue_health.status == "ok";
    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            queue: queue_health,
        }),
    )
}
