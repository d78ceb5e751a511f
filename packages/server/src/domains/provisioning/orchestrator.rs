//! Provisioning orchestrator.
//!
//! Runs the full pipeline for one request: sanitize the owner, then
//! for each resource (project, chat, deployment, custom domain) reuse
//! what a previous attempt already created before creating anything
//! new. Re-running after any partial failure converges on the same
//! resources instead of duplicating them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use v0_client::{Chat, CreateChatRequest, Deployment, ModelConfiguration, Project};

use crate::kernel::ServerDeps;

use super::error::ProvisionError;
use super::models::{ChatSummary, ProjectSummary, ProvisionOutcome, ProvisioningRequest};
use super::sanitize::{domain_label, sanitize_owner};

/// System prompt for generation chats.
const SYSTEM_PROMPT: &str = "You are a great frontend developer";

/// Generation model and its fixed settings.
const MODEL_ID: &str = "v0-1.5-sm";

// Progress checkpoints reported while the pipeline advances.
const PROGRESS_VALIDATED: i16 = 10;
const PROGRESS_PROJECT: i16 = 30;
const PROGRESS_CHAT: i16 = 55;
const PROGRESS_DEPLOYMENT: i16 = 75;
const PROGRESS_DOMAIN: i16 = 95;

/// Receives progress checkpoints during a provisioning run.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, progress: i16);
}

/// Sink that discards progress. For direct invocations and tests.
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn report(&self, _progress: i16) {}
}

pub struct Orchestrator {
    deps: Arc<ServerDeps>,
}

impl Orchestrator {
    pub fn new(deps: Arc<ServerDeps>) -> Self {
        Self { deps }
    }

    /// Run the provisioning pipeline to completion.
    #[instrument(skip_all, fields(owner = %request.owner))]
    pub async fn provision(
        &self,
        request: &ProvisioningRequest,
        progress: &dyn ProgressSink,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let owner = sanitize_owner(&request.owner)?;
        let label = domain_label(&owner, request.app_name.as_deref())?;
        progress.report(PROGRESS_VALIDATED).await;

        let project = self.ensure_project(&owner, &request.description).await?;
        progress.report(PROGRESS_PROJECT).await;

        let (chat, version_id) = self
            .ensure_chat(&owner, &project.id, &request.message)
            .await?;
        progress.report(PROGRESS_CHAT).await;

        let deployment = self
            .ensure_deployment(&project.id, &chat.id, &version_id)
            .await?;
        progress.report(PROGRESS_DEPLOYMENT).await;

        let custom_domain = self
            .attach_domain(&owner, &label, &deployment)
            .await?;
        progress.report(PROGRESS_DOMAIN).await;

        info!(owner = %owner, domain = %custom_domain, "provisioning pipeline finished");

        Ok(ProvisionOutcome::for_domain(
            ProjectSummary {
                id: project.id,
                name: project.name,
            },
            ChatSummary {
                id: chat.id,
                version_id,
            },
            deployment,
            &custom_domain,
        ))
    }

    /// Reuse the owner's project when it still exists remotely,
    /// otherwise create one and persist the mapping.
    async fn ensure_project(
        &self,
        owner: &str,
        description: &str,
    ) -> Result<Project, ProvisionError> {
        let record = self.deps.store.find_by_owner(owner).await?;

        if let Some(record) = &record {
            if let Some(project) = self.deps.generation.get_project(&record.project_id).await? {
                info!(project_id = %project.id, "reusing existing project");
                return Ok(project);
            }
            // Stored id points at a remote object that no longer
            // exists; fall through and recreate.
        }

        let project_name = format!("project_{owner}");
        let project = self
            .deps
            .generation
            .create_project(&project_name, description)
            .await?;

        self.deps
            .store
            .upsert_project(owner, &project_name, &project.id)
            .await?;

        info!(project_id = %project.id, "created project");
        Ok(project)
    }

    /// Reuse the owner's chat when it still exists remotely, otherwise
    /// create one. The chat must carry a generated version before the
    /// pipeline can continue.
    async fn ensure_chat(
        &self,
        owner: &str,
        project_id: &str,
        message: &str,
    ) -> Result<(Chat, String), ProvisionError> {
        let record = self.deps.store.find_by_owner(owner).await?;

        if let Some(chat_id) = record.as_ref().and_then(|r| r.chat_id.as_deref()) {
            if let Some(chat) = self.deps.generation.get_chat(chat_id).await? {
                info!(chat_id = %chat.id, "reusing existing chat");
                return Self::with_version(chat);
            }
        }

        let chat = self
            .deps
            .generation
            .create_chat(&CreateChatRequest {
                system: SYSTEM_PROMPT.to_string(),
                message: message.to_string(),
                model_configuration: ModelConfiguration {
                    model_id: MODEL_ID.to_string(),
                    image_generations: false,
                    thinking: false,
                },
                project_id: project_id.to_string(),
            })
            .await?;

        self.deps.store.upsert_chat(owner, &chat.id).await?;

        info!(chat_id = %chat.id, "created chat");
        Self::with_version(chat)
    }

    fn with_version(chat: Chat) -> Result<(Chat, String), ProvisionError> {
        match &chat.latest_version {
            Some(version) => {
                let version_id = version.id.clone();
                Ok((chat, version_id))
            }
            None => Err(ProvisionError::Permanent(
                "chat has no generated version".into(),
            )),
        }
    }

    /// Reuse a deployment of this exact (project, chat, version)
    /// triple when one exists, otherwise create it.
    async fn ensure_deployment(
        &self,
        project_id: &str,
        chat_id: &str,
        version_id: &str,
    ) -> Result<Deployment, ProvisionError> {
        let existing = self
            .deps
            .generation
            .find_deployments(project_id, chat_id, version_id)
            .await?;

        if let Some(deployment) = existing.into_iter().next() {
            info!(deployment_id = %deployment.id, "reusing existing deployment");
            return Ok(deployment);
        }

        let deployment = self
            .deps
            .generation
            .create_deployment(project_id, chat_id, version_id)
            .await?;

        info!(deployment_id = %deployment.id, "created deployment");
        Ok(deployment)
    }

    /// Attach `<label>.<suffix>` to the deployment's hosting project
    /// and persist the final mapping.
    async fn attach_domain(
        &self,
        owner: &str,
        label: &str,
        deployment: &Deployment,
    ) -> Result<String, ProvisionError> {
        let domain = format!("{label}.{}", self.deps.domain_suffix);
        let slug = project_slug_from_inspector_url(&deployment.inspector_url)?;

        self.deps.domains.add_project_domain(&slug, &domain).await?;

        self.deps
            .store
            .upsert_deployment(owner, &deployment.id, &domain)
            .await?;

        info!(domain = %domain, "custom domain attached");
        Ok(domain)
    }
}

/// Extract the hosting project slug from a deployment inspector URL
/// of the shape `https://vercel.com/<team>/<project>/<deployment>`.
fn project_slug_from_inspector_url(inspector_url: &str) -> Result<String, ProvisionError> {
    inspector_url
        .split('/')
        .nth(4)
        .filter(|slug| !slug.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ProvisionError::Permanent(format!(
                "cannot derive project slug from inspector URL: {inspector_url}"
            ))
        })
}
