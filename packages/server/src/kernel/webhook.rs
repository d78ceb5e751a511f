//! Best-effort webhook notification on terminal job transitions.
//!
//! Delivery is decoupled from job durability: a failed POST is logged
//! and dropped, and never changes job state. Without a configured
//! endpoint the notifier is a no-op.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::jobs::JobStatus;

const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Terminal-transition event delivered to the configured endpoint as
/// `{"jobId", "status", "result"|"error"}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookEvent {
    pub fn completed(job_id: Uuid, result: Value) -> Self {
        Self {
            job_id,
            status: JobStatus::Completed,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(job_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            job_id,
            status: JobStatus::Failed,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Fire-and-forget webhook sender.
pub struct WebhookNotifier {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a notifier. `endpoint = None` disables delivery.
    pub fn new(endpoint: Option<String>) -> Result<Self> {
        if endpoint.is_none() {
            warn!("WEBHOOK_URL not set; webhook notifications disabled");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
            .build()
            .context("Failed to create webhook HTTP client")?;

        Ok(Self { endpoint, client })
    }

    /// Deliver one event. One attempt, short timeout; failure is
    /// logged and swallowed.
    pub async fn notify(&self, event: &WebhookEvent) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };

        match self.client.post(endpoint).json(event).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(job_id = %event.job_id, status = ?event.status, "webhook delivered");
            }
            Ok(response) => {
                warn!(
                    job_id = %event.job_id,
                    status_code = response.status().as_u16(),
                    "webhook endpoint responded with non-2xx"
                );
            }
            Err(e) => {
                warn!(job_id = %event.job_id, error = %e, "webhook delivery failed");
            }
        }
    }
}
