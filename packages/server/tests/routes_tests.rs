//! HTTP surface tests against an in-memory queue.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use server_core::kernel::jobs::{InMemoryJobStore, JobQueue, RetryPolicy, StatusService};
use server_core::server::{build_app, AppState};

fn app() -> (axum::Router, Arc<JobQueue>) {
    let store = Arc::new(InMemoryJobStore::new());
    let queue = Arc::new(JobQueue::new(store.clone(), RetryPolicy::default()));
    let status = Arc::new(StatusService::new(store));
    let router = build_app(AppState {
        queue: queue.clone(),
        status,
    });
    (router, queue)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn generate_accepts_and_returns_job_id() {
    let (app, _) = app();

    let response = app
        .oneshot(post_json(
            "/api/web-generator/generate",
            json!({
                "owner": "Alice_01!",
                "message": "build a landing page",
                "description": "landing page"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "queued");
    assert!(body["jobId"].as_str().unwrap().parse::<uuid::Uuid>().is_ok());
}

#[tokio::test]
async fn generate_rejects_invalid_owner_with_400() {
    let (app, _) = app();

    let response = app
        .oneshot(post_json(
            "/api/web-generator/generate",
            json!({
                "owner": "!!!",
                "message": "build",
                "description": "site"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("non-empty"));
}

#[tokio::test]
async fn status_of_unknown_job_is_not_found() {
    let (app, _) = app();

    let id = uuid::Uuid::now_v7();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/web-generator/status/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "not_found");
}

#[tokio::test]
async fn status_with_malformed_id_is_not_found() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/web-generator/status/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "not_found");
    assert_eq!(body["jobId"], "not-a-uuid");
}

#[tokio::test]
async fn status_reflects_queued_job() {
    let (app, queue) = app();

    let job = queue
        .enqueue(&server_core::domains::provisioning::ProvisioningRequest {
            owner: "alice01".into(),
            message: "build".into(),
            description: "site".into(),
            app_name: None,
        })
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/web-generator/status/{}", job.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["status"], "queued");
    assert_eq!(body["progress"], 0);
    assert_eq!(body["attempt"], 1);
}

#[tokio::test]
async fn queue_stats_count_waiting_jobs() {
    let (app, queue) = app();

    for owner in ["alice01", "bob02"] {
        queue
            .enqueue(&server_core::domains::provisioning::ProvisioningRequest {
                owner: owner.into(),
                message: "build".into(),
                description: "site".into(),
                app_name: None,
            })
            .await
            .unwrap();
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/web-generator/queue/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["waiting"], 2);
    assert_eq!(body["active"], 0);
    assert_eq!(body["completed"], 0);
    assert_eq!(body["failed"], 0);
}

#[tokio::test]
async fn health_reports_healthy_queue() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["queue"]["status"], "ok");
}
