use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ProfileStore, StoreError, StoreHealth, StoreSeed};
use crate::models::{Role, UserProfile};

/// Map-backed store for tests and local runs
///
/// Counts every fetch so callers can check how often the resolvers reach
/// the store, and can be switched into a failing mode to exercise the
/// fallback paths.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
    roles: RwLock<HashMap<String, Role>>,
    failing: AtomicBool,
    profile_fetches: AtomicUsize,
    role_fetches: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(mut self, profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let map = self.profiles.get_mut();
        for profile in profiles {
            map.insert(profile.id.clone(), profile);
        }
        self
    }

    pub fn with_role(mut self, user_id: impl Into<String>, role: Role) -> Self {
        self.roles.get_mut().insert(user_id.into(), role);
        self
    }

    pub async fn seed(&self, seed: &StoreSeed) {
        let mut profiles = self.profiles.write().await;
        for profile in &seed.profiles {
            profiles.insert(profile.id.clone(), profile.clone());
        }
        drop(profiles);

        let mut roles = self.roles.write().await;
        for assignment in &seed.roles {
            roles.insert(assignment.user_id.clone(), assignment.role.clone());
        }
    }

    pub async fn put_profile(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }

    pub async fn put_role(&self, user_id: impl Into<String>, role: Role) {
        self.roles.write().await.insert(user_id.into(), role);
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of batched profile fetches served so far
    pub fn profile_fetches(&self) -> usize {
        self.profile_fetches.load(Ordering::SeqCst)
    }

    /// Number of role fetches served so far
    pub fn role_fetches(&self) -> usize {
        self.role_fetches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch_profiles(&self, ids: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        self.profile_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let profiles = self.profiles.read().await;
        Ok(ids.iter().filter_map(|id| profiles.get(id).cloned()).collect())
    }

    async fn fetch_role(&self, user_id: &str) -> Result<Option<Role>, StoreError> {
        self.role_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        Ok(self.roles.read().await.get(user_id).cloned())
    }

    async fn health_check(&self) -> StoreHealth {
        match self.check_available() {
            Ok(()) => StoreHealth::Healthy,
            Err(e) => StoreHealth::Unhealthy(e.to_string()),
        }
    }
}
