//! Minimal Vercel REST API client.
//!
//! Only covers what the provisioning pipeline needs: attaching a
//! custom domain to the project behind a deployment.

pub mod error;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use error::{Result, VercelError};

const DEFAULT_BASE_URL: &str = "https://api.vercel.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A domain attached to a Vercel project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDomain {
    pub name: String,
    #[serde(default)]
    pub apex_name: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Serialize)]
struct AddDomainRequest<'a> {
    name: &'a str,
}

/// Vercel API client.
#[derive(Debug, Clone)]
pub struct VercelClient {
    bearer_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl VercelClient {
    /// Create a new client against the production API.
    pub fn new(bearer_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(bearer_token, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (testing, proxies).
    pub fn with_base_url(
        bearer_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let bearer_token = bearer_token.into();
        if bearer_token.is_empty() {
            return Err(VercelError::Config(
                "Vercel bearer token must not be empty".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| VercelError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            bearer_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Attach a domain to a project, addressed by project id or slug.
    pub async fn add_project_domain(
        &self,
        project_id_or_name: &str,
        domain: &str,
    ) -> Result<ProjectDomain> {
        let url = format!(
            "{}/v10/projects/{}/domains",
            self.base_url, project_id_or_name
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(&AddDomainRequest { name: domain })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VercelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let attached: ProjectDomain = response
            .json()
            .await
            .map_err(|e| VercelError::Parse(e.to_string()))?;
        info!(domain = %attached.name, project = %project_id_or_name, "domain attached");
        Ok(attached)
    }
}
