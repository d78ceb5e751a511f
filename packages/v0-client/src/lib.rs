//! REST client for the v0 Platform API.
//!
//! Covers the three resources the provisioning pipeline needs:
//! projects, chats and deployments. Lookups return `Ok(None)` when the
//! remote object no longer exists (404) so callers can fall back to
//! re-creating it.

pub mod error;
pub mod types;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

pub use error::{Result, V0Error};
pub use types::{
    Chat, ChatVersion, CreateChatRequest, CreateDeploymentRequest, CreateProjectRequest,
    Deployment, DeploymentList, ModelConfiguration, Project,
};

const DEFAULT_BASE_URL: &str = "https://api.v0.dev/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// v0 Platform API client.
#[derive(Debug, Clone)]
pub struct V0Client {
    api_key: String,
    base_url: String,
    client: Client,
}

impl V0Client {
    /// Create a new client against the production API.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (testing, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(V0Error::Config("v0 API key must not be empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| V0Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a project.
    pub async fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        let body = CreateProjectRequest {
            name: name.to_string(),
            description: description.to_string(),
        };
        let response = self
            .client
            .post(format!("{}/projects", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Fetch a project by id. Returns `None` if it no longer exists.
    pub async fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        let response = self
            .client
            .get(format!("{}/projects/{}", self.base_url, project_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::parse_optional(response).await
    }

    /// Create a chat and kick off generation.
    pub async fn create_chat(&self, request: &CreateChatRequest) -> Result<Chat> {
        let response = self
            .client
            .post(format!("{}/chats", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Fetch a chat by id. Returns `None` if it no longer exists.
    pub async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        let response = self
            .client
            .get(format!("{}/chats/{}", self.base_url, chat_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::parse_optional(response).await
    }

    /// List deployments for a (project, chat, version) triple.
    pub async fn find_deployments(
        &self,
        project_id: &str,
        chat_id: &str,
        version_id: &str,
    ) -> Result<Vec<Deployment>> {
        let response = self
            .client
            .get(format!("{}/deployments", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[
                ("projectId", project_id),
                ("chatId", chat_id),
                ("versionId", version_id),
            ])
            .send()
            .await?;
        let list: DeploymentList = Self::parse(response).await?;
        Ok(list.data)
    }

    /// Create a deployment for a (project, chat, version) triple.
    pub async fn create_deployment(
        &self,
        project_id: &str,
        chat_id: &str,
        version_id: &str,
    ) -> Result<Deployment> {
        let body = CreateDeploymentRequest {
            project_id: project_id.to_string(),
            chat_id: chat_id.to_string(),
            version_id: version_id.to_string(),
        };
        let response = self
            .client
            .post(format!("{}/deployments", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "v0 API request failed");
            return Err(V0Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| V0Error::Parse(e.to_string()))
    }

    async fn parse_optional<T: DeserializeOwned>(response: reqwest::Response) -> Result<Option<T>> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::parse(response).await.map(Some)
    }
}
