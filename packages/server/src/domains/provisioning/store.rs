//! Owner → provisioned-resource store.
//!
//! Keyed on the sanitized owner identity; a unique constraint
//! guarantees at most one record per owner, and upserts are single
//! statements so concurrent workers cannot lose each other's writes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::ProvisionError;
use super::models::ProvisioningRecord;

/// Store contract for provisioning records.
///
/// Unavailability surfaces as a retryable error; the job queue will
/// try the whole pipeline again.
#[async_trait]
pub trait ProvisioningStore: Send + Sync {
    async fn find_by_owner(&self, owner: &str)
        -> Result<Option<ProvisioningRecord>, ProvisionError>;

    /// Insert or refresh the project mapping for an owner.
    async fn upsert_project(
        &self,
        owner: &str,
        project_name: &str,
        project_id: &str,
    ) -> Result<(), ProvisionError>;

    /// Attach a chat id to an existing owner record.
    async fn upsert_chat(&self, owner: &str, chat_id: &str) -> Result<(), ProvisionError>;

    /// Attach deployment id and custom domain to an existing record.
    async fn upsert_deployment(
        &self,
        owner: &str,
        deployment_id: &str,
        custom_domain: &str,
    ) -> Result<(), ProvisionError>;
}

const RECORD_COLUMNS: &str = "id, owner, project_name, project_id, chat_id, deployment_id, \
                              custom_domain, created_at, updated_at";

/// PostgreSQL-backed provisioning store.
pub struct PostgresProvisioningStore {
    pool: PgPool,
}

impl PostgresProvisioningStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProvisioningStore for PostgresProvisioningStore {
    async fn find_by_owner(
        &self,
        owner: &str,
    ) -> Result<Option<ProvisioningRecord>, ProvisionError> {
        let record = sqlx::query_as::<_, ProvisioningRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM web_generator WHERE owner = $1"
        ))
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(ProvisionError::store)?;

        Ok(record)
    }

    async fn upsert_project(
        &self,
        owner: &str,
        project_name: &str,
        project_id: &str,
    ) -> Result<(), ProvisionError> {
        // Single-statement upsert: two workers racing on the same
        // owner cannot both insert, the loser updates instead.
        sqlx::query(
            r#"
            INSERT INTO web_generator (id, owner, project_name, project_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (owner) DO UPDATE SET
                project_name = EXCLUDED.project_name,
                project_id = EXCLUDED.project_id,
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(owner)
        .bind(project_name)
        .bind(project_id)
        .execute(&self.pool)
        .await
        .map_err(ProvisionError::store)?;

        Ok(())
    }

    async fn upsert_chat(&self, owner: &str, chat_id: &str) -> Result<(), ProvisionError> {
        sqlx::query(
            "UPDATE web_generator SET chat_id = $1, updated_at = NOW() WHERE owner = $2",
        )
        .bind(chat_id)
        .bind(owner)
        .execute(&self.pool)
        .await
        .map_err(ProvisionError::store)?;

        Ok(())
    }

    async fn upsert_deployment(
        &self,
        owner: &str,
        deployment_id: &str,
        custom_domain: &str,
    ) -> Result<(), ProvisionError> {
        sqlx::query(
            r#"
            UPDATE web_generator
            SET deployment_id = $1, custom_domain = $2, updated_at = NOW()
            WHERE owner = $3
            "#,
        )
        .bind(deployment_id)
        .bind(custom_domain)
        .bind(owner)
        .execute(&self.pool)
        .await
        .map_err(ProvisionError::store)?;

        Ok(())
    }
}

/// In-memory provisioning store for tests and offline runs.
#[derive(Default)]
pub struct InMemoryProvisioningStore {
    records: Mutex<HashMap<String, ProvisioningRecord>>,
}

impl InMemoryProvisioningStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held; test assertion helper.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl ProvisioningStore for InMemoryProvisioningStore {
    async fn find_by_owner(
        &self,
        owner: &str,
    ) -> Result<Option<ProvisioningRecord>, ProvisionError> {
        Ok(self.records.lock().await.get(owner).cloned())
    }

    async fn upsert_project(
        &self,
        owner: &str,
        project_name: &str,
        project_id: &str,
    ) -> Result<(), ProvisionError> {
        let mut records = self.records.lock().await;
        let now = Utc::now();
        records
            .entry(owner.to_string())
            .and_modify(|record| {
                record.project_name = project_name.to_string();
                record.project_id = project_id.to_string();
                record.updated_at = now;
            })
            .or_insert_with(|| ProvisioningRecord {
                id: Uuid::now_v7(),
                owner: owner.to_string(),
                project_name: project_name.to_string(),
                project_id: project_id.to_string(),
                chat_id: None,
                deployment_id: None,
                custom_domain: None,
                created_at: now,
                updated_at: now,
            });
        Ok(())
    }

    async fn upsert_chat(&self, owner: &str, chat_id: &str) -> Result<(), ProvisionError> {
        let mut records = self.records.lock().await;
        if let Some(record) = records.get_mut(owner) {
            record.chat_id = Some(chat_id.to_string());
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn upsert_deployment(
        &self,
        owner: &str,
        deployment_id: &str,
        custom_domain: &str,
    ) -> Result<(), ProvisionError> {
        let mut records = self.records.lock().await;
        if let Some(record) = records.get_mut(owner) {
            record.deployment_id = Some(deployment_id.to_string());
            record.custom_domain = Some(custom_domain.to_string());
            record.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_project_creates_then_updates_single_record() {
        let store = InMemoryProvisioningStore::new();

        store
            .upsert_project("alice01", "project_alice01", "prj_1")
            .await
            .unwrap();
        store
            .upsert_project("alice01", "project_alice01", "prj_2")
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        let record = store.find_by_owner("alice01").await.unwrap().unwrap();
        assert_eq!(record.project_id, "prj_2");
    }

    #[tokio::test]
    async fn chat_and_deployment_attach_to_existing_record() {
        let store = InMemoryProvisioningStore::new();
        store
            .upsert_project("alice01", "project_alice01", "prj_1")
            .await
            .unwrap();

        store.upsert_chat("alice01", "chat_1").await.unwrap();
        store
            .upsert_deployment("alice01", "dpl_1", "alice01.trady.finance")
            .await
            .unwrap();

        let record = store.find_by_owner("alice01").await.unwrap().unwrap();
        assert_eq!(record.chat_id.as_deref(), Some("chat_1"));
        assert_eq!(record.deployment_id.as_deref(), Some("dpl_1"));
        assert_eq!(record.custom_domain.as_deref(), Some("alice01.trady.finance"));
    }

    #[tokio::test]
    async fn find_unknown_owner_returns_none() {
        let store = InMemoryProvisioningStore::new();
        assert!(store.find_by_owner("nobody").await.unwrap().is_none());
    }
}
