use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::models::{Resolved, Role};
use crate::store::ProfileStore;

pub type RoleCache = TtlCache<Resolved<Role>>;

/// Cached lookup of a user's role
///
/// A missing row or an unreachable store both resolve to [`Role::user`],
/// and that default is cached like any other answer.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn ProfileStore>,
    cache: RoleCache,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn ProfileStore>, cache: RoleCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &RoleCache {
        &self.cache
    }

    pub async fn resolve_role(&self, user_id: &str) -> Resolved<Role> {
        if let Some(cached) = self.cache.get(user_id).await {
            return cached.from_cache();
        }

        let resolved = match self.store.fetch_role(user_id).await {
            Ok(Some(role)) => Resolved::from_store(role),
            Ok(None) => {
                debug!(user_id = %user_id, "No role row, defaulting to user");
                Resolved::fallback(Role::user())
            }
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    error = %e,
                    "Role fetch failed, defaulting to user"
                );
                counter!("store_errors_total", "operation" => "fetch_role").increment(1);
                Resolved::fallback(Role::user())
            }
        };

        counter!("resolutions_total", "kind" => "role", "origin" => resolved.origin.as_str())
            .increment(1);
        self.cache.set(user_id, resolved.clone()).await;

        resolved
    }

    /// Drop the cached role for `user_id`, e.g. after a role change
    pub async fn invalidate(&self, user_id: &str) {
        self.cache.invalidate(user_id).await;
    }
}
