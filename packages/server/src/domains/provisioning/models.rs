//! Data model for the provisioning domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use v0_client::Deployment;

/// Immutable provisioning input. The owner identity is the base of the
/// idempotency key for everything downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    pub owner: String,
    pub message: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
}

/// Persisted owner → provisioned-resource mapping.
///
/// At most one record exists per owner identity (unique constraint).
/// Created on first successful project creation, then read and
/// updated; the core never deletes it.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningRecord {
    pub id: Uuid,
    pub owner: String,
    pub project_name: String,
    pub project_id: String,
    pub chat_id: Option<String>,
    pub deployment_id: Option<String>,
    pub custom_domain: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project portion of a provisioning result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
}

/// Chat portion of a provisioning result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: String,
    pub version_id: String,
}

/// URLs exposed to the caller once provisioning finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeUrls {
    /// Custom domain URL (primary)
    pub custom_domain: String,
    /// Main URL to use
    pub primary_url: String,
}

/// Terminal result of a successful provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionOutcome {
    pub project: ProjectSummary,
    pub chat: ChatSummary,
    pub deployment: Deployment,
    pub urls: OutcomeUrls,
    pub success: bool,
    pub message: String,
}

impl ProvisionOutcome {
    /// Assemble the outcome for a freshly attached custom domain.
    pub fn for_domain(
        project: ProjectSummary,
        chat: ChatSummary,
        deployment: Deployment,
        custom_domain: &str,
    ) -> Self {
        let url = format!("https://{custom_domain}");
        Self {
            project,
            chat,
            deployment,
            urls: OutcomeUrls {
                custom_domain: url.clone(),
                primary_url: url.clone(),
            },
            success: true,
            message: format!("Website successfully deployed and available at: {url}"),
        }
    }
}
