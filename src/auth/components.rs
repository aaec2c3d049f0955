//! Access components for dependency injection
//!
//! Builds the store, both caches, the resolvers and the authorizer from one
//! configuration so that HTTP handlers, background tasks and tests all share
//! the same instances.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::auth::{Authorizer, RoleResolver};
use crate::cache::{CacheStats, CacheSweeper, Sweepable, TtlCache};
use crate::config::{AppConfig, CacheSettings, StoreConfig};
use crate::profiles::ProfileResolver;
use crate::store::{InMemoryProfileStore, ProfileStore, StoreSeed, SurrealProfileStore};

/// Bundle of everything the access layer needs
///
/// Cloning is cheap; clones share the store and the cache storage.
#[derive(Clone)]
pub struct AccessComponents {
    pub store: Arc<dyn ProfileStore>,
    pub profiles: ProfileResolver,
    pub authorizer: Authorizer,
}

impl AccessComponents {
    /// Wire the resolvers around an existing store
    pub fn new(store: Arc<dyn ProfileStore>, settings: &CacheSettings) -> Self {
        let profile_cache = TtlCache::new("profiles", settings.profile_cache());
        let role_cache = TtlCache::new("roles", settings.role_cache());

        let profiles = ProfileResolver::new(store.clone(), profile_cache);
        let roles = RoleResolver::new(store.clone(), role_cache);

        Self {
            store,
            profiles,
            authorizer: Authorizer::new(roles),
        }
    }

    /// Create components from application config, connecting and seeding
    /// the configured store backend
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store = build_store(&config.store).await?;
        Ok(Self::new(store, &config.cache))
    }

    pub fn roles(&self) -> &RoleResolver {
        self.authorizer.roles()
    }

    /// Start the periodic sweep over both caches
    pub fn start_sweeper(&self, every: Duration) -> CacheSweeper {
        let caches: Vec<Arc<dyn Sweepable>> = vec![
            Arc::new(self.profiles.cache().clone()) as Arc<dyn Sweepable>,
            Arc::new(self.roles().cache().clone()) as Arc<dyn Sweepable>,
        ];
        CacheSweeper::start(caches, every)
    }

    /// Forget everything cached about a user
    pub async fn invalidate_user(&self, user_id: &str) {
        self.profiles.invalidate(user_id).await;
        self.roles().invalidate(user_id).await;
        info!(user_id = %user_id, "Invalidated cached profile and role");
    }

    /// Get cache statistics for monitoring
    pub async fn stats(&self) -> AccessStats {
        AccessStats {
            profiles: self.profiles.cache().stats().await,
            roles: self.roles().cache().stats().await,
        }
    }
}

/// Statistics about the access layer caches
#[derive(Debug, Clone, Serialize)]
pub struct AccessStats {
    pub profiles: CacheStats,
    pub roles: CacheStats,
}

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn ProfileStore>> {
    let seed = match &config.seed_file {
        Some(path) => Some(StoreSeed::from_path(path)?),
        None => None,
    };

    let store: Arc<dyn ProfileStore> = match config.backend.as_str() {
        "surreal" => {
            let store = SurrealProfileStore::connect(&config.surreal())
                .await
                .context("Failed to start SurrealDB store")?;
            if let Some(seed) = &seed {
                store.seed(seed).await.context("Failed to seed SurrealDB store")?;
            }
            Arc::new(store)
        }
        "memory" => {
            let store = InMemoryProfileStore::new();
            if let Some(seed) = &seed {
                store.seed(seed).await;
            }
            Arc::new(store)
        }
        other => anyhow::bail!("Unsupported store backend: {}", other),
    };

    info!(
        backend = %config.backend,
        seeded = seed.is_some(),
        "Profile store ready"
    );

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, UserProfile};
    use std::io::Write;

    fn components() -> (Arc<InMemoryProfileStore>, AccessComponents) {
        let store = Arc::new(
            InMemoryProfileStore::new()
                .with_profiles(vec![UserProfile::new("alice", "Alice")])
                .with_role("alice", Role::admin()),
        );
        let components = AccessComponents::new(store.clone(), &CacheSettings::default());
        (store, components)
    }

    #[tokio::test]
    async fn test_components_stats_start_empty() {
        let (_, components) = components();
        let stats = components.stats().await;

        assert_eq!(stats.profiles.hits, 0);
        assert_eq!(stats.profiles.entries, 0);
        assert_eq!(stats.roles.misses, 0);
    }

    #[tokio::test]
    async fn test_clones_share_caches() {
        let (store, components) = components();
        let other = components.clone();

        components.profiles.resolve_profile("alice").await;
        let again = other.profiles.resolve_profile("alice").await;

        assert!(again.cached);
        assert_eq!(store.profile_fetches(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_user_drops_profile_and_role() {
        let (store, components) = components();

        components.profiles.resolve_profile("alice").await;
        components.roles().resolve_role("alice").await;
        components.invalidate_user("alice").await;

        let stats = components.stats().await;
        assert_eq!(stats.profiles.entries, 0);
        assert_eq!(stats.roles.entries, 0);

        components.profiles.resolve_profile("alice").await;
        components.roles().resolve_role("alice").await;
        assert_eq!(store.profile_fetches(), 2);
        assert_eq!(store.role_fetches(), 2);
    }

    #[tokio::test]
    async fn test_sweeper_starts_and_stops() {
        let (_, components) = components();

        let sweeper = components.start_sweeper(Duration::from_secs(60));
        assert!(!sweeper.is_finished());
        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_from_config_memory_backend_with_seed() {
        let mut seed = tempfile::NamedTempFile::new().unwrap();
        write!(
            seed,
            r#"{{ "profiles": [{{ "id": "u1", "display_name": "Ada" }}],
                 "roles": [{{ "user_id": "u1", "role": "admin" }}] }}"#
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.store.seed_file = Some(seed.path().to_path_buf());

        let components = AccessComponents::from_config(&config).await.unwrap();

        let profile = components.profiles.resolve_profile("u1").await;
        assert_eq!(profile.value.display_name, "Ada");
        let result = components.authorizer.check_authorization("u1", "u2").await;
        assert!(result.is_admin);
    }

    #[tokio::test]
    async fn test_from_config_surreal_backend() {
        let mut config = AppConfig::default();
        config.store.backend = "surreal".to_string();

        let components = AccessComponents::from_config(&config).await.unwrap();

        assert!(components.store.health_check().await.is_healthy());
        let profile = components.profiles.resolve_profile("nobody").await;
        assert!(profile.is_fallback());
    }

    #[tokio::test]
    async fn test_from_config_missing_seed_file_fails() {
        let mut config = AppConfig::default();
        config.store.seed_file = Some("/nonexistent/seed.json".into());

        assert!(AccessComponents::from_config(&config).await.is_err());
    }
}
