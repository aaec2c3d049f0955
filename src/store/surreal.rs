//! SurrealDB-backed profile store
//!
//! Uses the embedded in-memory engine. Profiles live in the `profile` table
//! and roles in `user_role`, both keyed by user id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::engine::local::{Db, Mem};
use surrealdb::{RecordId, Surreal};

use super::{ProfileStore, StoreError, StoreHealth, StoreSeed};
use crate::models::{Role, UserProfile};

const PROFILE_TABLE: &str = "profile";
const ROLE_TABLE: &str = "user_role";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileRecord {
    user_id: String,
    display_name: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl From<UserProfile> for ProfileRecord {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.id,
            display_name: profile.display_name,
            avatar_url: profile.avatar_url,
        }
    }
}

impl From<ProfileRecord> for UserProfile {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: record.user_id,
            display_name: record.display_name,
            avatar_url: record.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RoleRecord {
    user_id: String,
    role: String,
}

/// Configuration for the embedded SurrealDB engine
#[derive(Debug, Clone)]
pub struct SurrealStoreConfig {
    pub namespace: String,
    pub database: String,
}

impl Default for SurrealStoreConfig {
    fn default() -> Self {
        Self {
            namespace: "profile_authz".to_string(),
            database: "main".to_string(),
        }
    }
}

pub struct SurrealProfileStore {
    client: Surreal<Db>,
}

impl SurrealProfileStore {
    pub async fn connect(config: &SurrealStoreConfig) -> Result<Self, StoreError> {
        let client = Surreal::new::<Mem>(())
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("Failed to create client: {}", e)))?;

        client
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("Failed to use namespace/database: {}", e))
            })?;

        tracing::info!(
            namespace = %config.namespace,
            database = %config.database,
            "Connected to embedded SurrealDB"
        );

        Ok(Self { client })
    }

    pub async fn put_profile(&self, profile: UserProfile) -> Result<(), StoreError> {
        let record = ProfileRecord::from(profile);
        let record_id = RecordId::from_table_key(PROFILE_TABLE, record.user_id.clone());

        let _: Option<surrealdb::Value> = self
            .client
            .upsert(record_id)
            .content(record)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Profile upsert failed: {}", e)))?;

        Ok(())
    }

    pub async fn put_role(&self, user_id: &str, role: Role) -> Result<(), StoreError> {
        let record = RoleRecord {
            user_id: user_id.to_string(),
            role: role.as_str().to_string(),
        };
        let record_id = RecordId::from_table_key(ROLE_TABLE, user_id.to_string());

        let _: Option<surrealdb::Value> = self
            .client
            .upsert(record_id)
            .content(record)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Role upsert failed: {}", e)))?;

        Ok(())
    }

    pub async fn seed(&self, seed: &StoreSeed) -> Result<(), StoreError> {
        for profile in &seed.profiles {
            self.put_profile(profile.clone()).await?;
        }
        for assignment in &seed.roles {
            self.put_role(&assignment.user_id, assignment.role.clone()).await?;
        }

        tracing::info!(
            profiles = seed.profiles.len(),
            roles = seed.roles.len(),
            "Seeded SurrealDB store"
        );
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SurrealProfileStore {
    async fn fetch_profiles(&self, ids: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        let mut response = self
            .client
            .query("SELECT user_id, display_name, avatar_url FROM type::table($table) WHERE user_id INSIDE $ids")
            .bind(("table", PROFILE_TABLE))
            .bind(("ids", ids.to_vec()))
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Profile query failed: {}", e)))?;

        let records: Vec<ProfileRecord> = response
            .take(0)
            .map_err(|e| StoreError::QueryFailed(format!("Failed to decode profiles: {}", e)))?;

        Ok(records.into_iter().map(UserProfile::from).collect())
    }

    async fn fetch_role(&self, user_id: &str) -> Result<Option<Role>, StoreError> {
        let mut response = self
            .client
            .query("SELECT user_id, role FROM type::table($table) WHERE user_id = $user_id LIMIT 1")
            .bind(("table", ROLE_TABLE))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Role query failed: {}", e)))?;

        let records: Vec<RoleRecord> = response
            .take(0)
            .map_err(|e| StoreError::QueryFailed(format!("Failed to decode role: {}", e)))?;

        Ok(records.into_iter().next().map(|record| Role::new(record.role)))
    }

    async fn health_check(&self) -> StoreHealth {
        match self.client.health().await {
            Ok(()) => StoreHealth::Healthy,
            Err(e) => StoreHealth::Unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RoleAssignment;

    async fn seeded_store() -> SurrealProfileStore {
        let store = SurrealProfileStore::connect(&SurrealStoreConfig::default())
            .await
            .expect("embedded engine should start");

        store
            .seed(&StoreSeed {
                profiles: vec![
                    UserProfile::new("u1", "Ada").with_avatar("https://cdn.example/ada.png"),
                    UserProfile::new("u2", "Grace"),
                ],
                roles: vec![RoleAssignment {
                    user_id: "u1".to_string(),
                    role: Role::admin(),
                }],
            })
            .await
            .expect("seed should succeed");

        store
    }

    #[tokio::test]
    async fn test_fetch_profiles_by_id_set() {
        let store = seeded_store().await;

        let ids = vec!["u1".to_string(), "u2".to_string(), "missing".to_string()];
        let mut profiles = store.fetch_profiles(&ids).await.unwrap();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].id, "u1");
        assert_eq!(profiles[0].avatar_url.as_deref(), Some("https://cdn.example/ada.png"));
        assert_eq!(profiles[1], UserProfile::new("u2", "Grace"));
    }

    #[tokio::test]
    async fn test_fetch_profiles_empty_ids() {
        let store = seeded_store().await;

        let profiles = store.fetch_profiles(&[]).await.unwrap();
        assert!(profiles.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_role() {
        let store = seeded_store().await;

        assert_eq!(store.fetch_role("u1").await.unwrap(), Some(Role::admin()));
        assert_eq!(store.fetch_role("u2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = seeded_store().await;

        store.put_role("u1", Role::user()).await.unwrap();
        store.put_profile(UserProfile::new("u2", "Grace Hopper")).await.unwrap();

        assert_eq!(store.fetch_role("u1").await.unwrap(), Some(Role::user()));
        let profiles = store.fetch_profiles(&["u2".to_string()]).await.unwrap();
        assert_eq!(profiles, vec![UserProfile::new("u2", "Grace Hopper")]);
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = seeded_store().await;
        assert!(store.health_check().await.is_healthy());
    }
}
