//! Server dependencies for the provisioning pipeline (traits for testability)
//!
//! External services are consumed through trait objects so tests can
//! substitute in-memory doubles for the remote APIs and the store.

use std::sync::Arc;

use async_trait::async_trait;

use v0_client::{Chat, CreateChatRequest, Deployment, Project, V0Client, V0Error};
use vercel_client::{ProjectDomain, VercelClient, VercelError};

use crate::domains::provisioning::ProvisioningStore;
use crate::kernel::traits::{BaseDomainService, BaseGenerationService};

// =============================================================================
// V0Client Adapter (implements BaseGenerationService trait)
// =============================================================================

/// Wrapper around V0Client that implements the BaseGenerationService trait
pub struct V0Adapter(pub Arc<V0Client>);

impl V0Adapter {
    pub fn new(client: Arc<V0Client>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseGenerationService for V0Adapter {
    async fn create_project(&self, name: &str, description: &str) -> Result<Project, V0Error> {
        self.0.create_project(name, description).await
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, V0Error> {
        self.0.get_project(project_id).await
    }

    async fn create_chat(&self, request: &CreateChatRequest) -> Result<Chat, V0Error> {
        self.0.create_chat(request).await
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>, V0Error> {
        self.0.get_chat(chat_id).await
    }

    async fn find_deployments(
        &self,
        project_id: &str,
        chat_id: &str,
        version_id: &str,
    ) -> Result<Vec<Deployment>, V0Error> {
        self.0.find_deployments(project_id, chat_id, version_id).await
    }

    async fn create_deployment(
        &self,
        project_id: &str,
        chat_id: &str,
        version_id: &str,
    ) -> Result<Deployment, V0Error> {
        self.0.create_deployment(project_id, chat_id, version_id).await
    }
}

// =============================================================================
// VercelClient Adapter (implements BaseDomainService trait)
// =============================================================================

/// Wrapper around VercelClient that implements the BaseDomainService trait
pub struct VercelAdapter(pub Arc<VercelClient>);

impl VercelAdapter {
    pub fn new(client: Arc<VercelClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseDomainService for VercelAdapter {
    async fn add_project_domain(
        &self,
        project_id_or_name: &str,
        domain: &str,
    ) -> Result<ProjectDomain, VercelError> {
        self.0.add_project_domain(project_id_or_name, domain).await
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies the orchestrator needs (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn ProvisioningStore>,
    pub generation: Arc<dyn BaseGenerationService>,
    pub domains: Arc<dyn BaseDomainService>,
    /// Apex under which custom domains are created, e.g. `trady.finance`.
    pub domain_suffix: String,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn ProvisioningStore>,
        generation: Arc<dyn BaseGenerationService>,
        domains: Arc<dyn BaseDomainService>,
        domain_suffix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            generation,
            domains,
            domain_suffix: domain_suffix.into(),
        }
    }
}
