// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The orchestrator decides what to create and when to reuse; these
// traits only expose the remote calls.
//
// Naming convention: Base* for trait names (e.g., BaseGenerationService)

use async_trait::async_trait;

use v0_client::{Chat, CreateChatRequest, Deployment, Project, V0Error};
use vercel_client::{ProjectDomain, VercelError};

// =============================================================================
// Generation Service Trait (v0 Platform: projects, chats, deployments)
// =============================================================================

#[async_trait]
pub trait BaseGenerationService: Send + Sync {
    /// Create a project on the generation service.
    async fn create_project(&self, name: &str, description: &str) -> Result<Project, V0Error>;

    /// Fetch a project by id; `None` when the remote object is gone.
    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, V0Error>;

    /// Create a chat and kick off generation.
    async fn create_chat(&self, request: &CreateChatRequest) -> Result<Chat, V0Error>;

    /// Fetch a chat by id; `None` when the remote object is gone.
    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>, V0Error>;

    /// List deployments for a (project, chat, version) triple.
    async fn find_deployments(
        &self,
        project_id: &str,
        chat_id: &str,
        version_id: &str,
    ) -> Result<Vec<Deployment>, V0Error>;

    /// Create a deployment for a (project, chat, version) triple.
    async fn create_deployment(
        &self,
        project_id: &str,
        chat_id: &str,
        version_id: &str,
    ) -> Result<Deployment, V0Error>;
}

// =============================================================================
// Domain Service Trait (Vercel: custom domain attachment)
// =============================================================================

#[async_trait]
pub trait BaseDomainService: Send + Sync {
    /// Attach a custom domain to the project behind a deployment.
    async fn add_project_domain(
        &self,
        project_id_or_name: &str,
        domain: &str,
    ) -> Result<ProjectDomain, VercelError>;
}
