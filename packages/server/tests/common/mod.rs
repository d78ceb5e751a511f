//! In-memory doubles for the external provisioning services.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use server_core::domains::provisioning::InMemoryProvisioningStore;
use server_core::kernel::{BaseDomainService, BaseGenerationService, ServerDeps};
use v0_client::{Chat, ChatVersion, CreateChatRequest, Deployment, Project, V0Error};
use vercel_client::{ProjectDomain, VercelError};

#[derive(Default)]
struct GenState {
    projects: HashMap<String, Project>,
    chats: HashMap<String, Chat>,
    deployments: HashMap<(String, String, String), Deployment>,
    next_id: u32,
    /// Remaining calls that fail with a 503 before behaving normally.
    transient_failures: u32,
    /// When false, created chats come back without a generated version.
    chats_have_versions: bool,
    create_project_calls: u32,
    create_chat_calls: u32,
    create_deployment_calls: u32,
}

/// Scripted stand-in for the v0 Platform API.
pub struct FakeGenerationService {
    state: Mutex<GenState>,
}

impl FakeGenerationService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GenState {
                chats_have_versions: true,
                ..GenState::default()
            }),
        }
    }

    /// Make the next `n` API calls fail with a 503.
    pub async fn fail_next(&self, n: u32) {
        self.state.lock().await.transient_failures = n;
    }

    /// Created chats will have no generated version.
    pub async fn set_chats_versionless(&self) {
        self.state.lock().await.chats_have_versions = false;
    }

    /// Simulate the remote project being deleted out from under us.
    pub async fn delete_project(&self, project_id: &str) {
        self.state.lock().await.projects.remove(project_id);
    }

    pub async fn create_project_calls(&self) -> u32 {
        self.state.lock().await.create_project_calls
    }

    pub async fn create_chat_calls(&self) -> u32 {
        self.state.lock().await.create_chat_calls
    }

    pub async fn create_deployment_calls(&self) -> u32 {
        self.state.lock().await.create_deployment_calls
    }
}

fn check_outage(state: &mut GenState) -> Result<(), V0Error> {
    if state.transient_failures > 0 {
        state.transient_failures -= 1;
        return Err(V0Error::Api {
            status: 503,
            message: "service unavailable".into(),
        });
    }
    Ok(())
}

#[async_trait]
impl BaseGenerationService for FakeGenerationService {
    async fn create_project(&self, name: &str, description: &str) -> Result<Project, V0Error> {
        let mut state = self.state.lock().await;
        check_outage(&mut state)?;
        state.next_id += 1;
        state.create_project_calls += 1;
        let project = Project {
            id: format!("prj_{}", state.next_id),
            name: name.to_string(),
            description: Some(description.to_string()),
        };
        state.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, V0Error> {
        let mut state = self.state.lock().await;
        check_outage(&mut state)?;
        Ok(state.projects.get(project_id).cloned())
    }

    async fn create_chat(&self, request: &CreateChatRequest) -> Result<Chat, V0Error> {
        let mut state = self.state.lock().await;
        check_outage(&mut state)?;
        if !state.projects.contains_key(&request.project_id) {
            return Err(V0Error::Api {
                status: 404,
                message: format!("project {} not found", request.project_id),
            });
        }
        state.next_id += 1;
        state.create_chat_calls += 1;
        let chat = Chat {
            id: format!("chat_{}", state.next_id),
            latest_version: state.chats_have_versions.then(|| ChatVersion {
                id: format!("v_{}", state.next_id),
            }),
        };
        state.chats.insert(chat.id.clone(), chat.clone());
        Ok(chat)
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>, V0Error> {
        let mut state = self.state.lock().await;
        check_outage(&mut state)?;
        Ok(state.chats.get(chat_id).cloned())
    }

    async fn find_deployments(
        &self,
        project_id: &str,
        chat_id: &str,
        version_id: &str,
    ) -> Result<Vec<Deployment>, V0Error> {
        let mut state = self.state.lock().await;
        check_outage(&mut state)?;
        let key = (
            project_id.to_string(),
            chat_id.to_string(),
            version_id.to_string(),
        );
        Ok(state.deployments.get(&key).cloned().into_iter().collect())
    }

    async fn create_deployment(
        &self,
        project_id: &str,
        chat_id: &str,
        version_id: &str,
    ) -> Result<Deployment, V0Error> {
        let mut state = self.state.lock().await;
        check_outage(&mut state)?;
        state.next_id += 1;
        state.create_deployment_calls += 1;
        let deployment = Deployment {
            id: format!("dpl_{}", state.next_id),
            inspector_url: format!(
                "https://vercel.com/fake-team/hosting-slug-{project_id}/dpl_{}",
                state.next_id
            ),
            web_url: None,
        };
        let key = (
            project_id.to_string(),
            chat_id.to_string(),
            version_id.to_string(),
        );
        state.deployments.insert(key, deployment.clone());
        Ok(deployment)
    }
}

/// Scripted stand-in for the Vercel domains API.
#[derive(Default)]
pub struct FakeDomainService {
    /// (project slug, domain) pairs attached so far.
    pub attached: Mutex<Vec<(String, String)>>,
}

impl FakeDomainService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseDomainService for FakeDomainService {
    async fn add_project_domain(
        &self,
        project_id_or_name: &str,
        domain: &str,
    ) -> Result<ProjectDomain, VercelError> {
        self.attached
            .lock()
            .await
            .push((project_id_or_name.to_string(), domain.to_string()));
        Ok(ProjectDomain {
            name: domain.to_string(),
            apex_name: None,
            verified: false,
        })
    }
}

/// Everything a test needs to drive the pipeline in memory.
pub struct TestHarness {
    pub deps: Arc<ServerDeps>,
    pub store: Arc<InMemoryProvisioningStore>,
    pub generation: Arc<FakeGenerationService>,
    pub domains: Arc<FakeDomainService>,
}

pub fn harness() -> TestHarness {
    let store = Arc::new(InMemoryProvisioningStore::new());
    let generation = Arc::new(FakeGenerationService::new());
    let domains = Arc::new(FakeDomainService::new());
    let deps = Arc::new(ServerDeps::new(
        store.clone(),
        generation.clone(),
        domains.clone(),
        "trady.finance",
    ));
    TestHarness {
        deps,
        store,
        generation,
        domains,
    }
}
