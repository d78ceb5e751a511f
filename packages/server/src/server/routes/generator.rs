//! Web-generator endpoints: submit, job status, queue stats.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::domains::provisioning::ProvisioningRequest;
use crate::kernel::jobs::EnqueueError;
use crate::server::app::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAccepted {
    job_id: Uuid,
    status: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

/// POST /api/web-generator/generate
///
/// Validates the request and enqueues a provisioning job. Responds
/// 202 with the job id; the actual work happens in the background.
pub async fn generate_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<ProvisioningRequest>,
) -> Response {
    match state.queue.enqueue(&request).await {
        Ok(job) => (
            StatusCode::ACCEPTED,
            Json(GenerateAccepted {
                job_id: job.id,
                status: "queued",
            }),
        )
            .into_response(),
        Err(EnqueueError::Invalid(message)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: message }),
        )
            .into_response(),
        Err(EnqueueError::Store(e)) => {
            error!(error = %e, "failed to enqueue job");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to enqueue job".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/web-generator/status/:job_id
///
/// Unknown and malformed ids both report `not_found` with 200; the
/// endpoint answers "what do we know about this id", never 404.
pub async fn job_status_handler(
    Extension(state): Extension<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let Ok(job_id) = job_id.parse::<Uuid>() else {
        return Json(json!({
            "jobId": job_id,
            "status": "not_found",
            "progress": 0,
            "attempt": 0,
        }))
        .into_response();
    };

    match state.status.job_status(job_id).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!(job_id = %job_id, error = %e, "failed to query job status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to query job status".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/web-generator/queue/stats
pub async fn queue_stats_handler(Extension(state): Extension<AppState>) -> Response {
    match state.status.queue_stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            error!(error = %e, "failed to query queue stats");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to query queue stats".to_string(),
                }),
            )
                .into_response()
        }
    }
}
