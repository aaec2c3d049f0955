//! Batch profile resolution
//!
//! Resolves sets of user ids to display profiles for feed, comment and
//! booking views. Lookups go through the profile cache first; whatever is
//! missing is fetched from the store in one batched query. Resolution never
//! fails: ids the store does not know, or cannot answer for, come back as a
//! placeholder profile.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::models::{Resolved, UserProfile};
use crate::store::ProfileStore;

/// Resolved profiles keyed by user id
pub type ProfileMap = HashMap<String, Resolved<UserProfile>>;

/// Cache value type for profiles; keeps the origin alongside the profile
pub type ProfileCache = TtlCache<Resolved<UserProfile>>;

#[derive(Clone)]
pub struct ProfileResolver {
    store: Arc<dyn ProfileStore>,
    cache: ProfileCache,
}

impl ProfileResolver {
    pub fn new(store: Arc<dyn ProfileStore>, cache: ProfileCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    /// Resolve every distinct, non-empty id in `ids`
    ///
    /// The result holds exactly one entry per distinct id. At most one store
    /// query is issued, and none when every id is cached.
    pub async fn resolve_profiles<I, S>(&self, ids: I) -> ProfileMap
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: BTreeSet<String> = ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        if ids.is_empty() {
            return ProfileMap::new();
        }

        let (hits, misses) = self.cache.get_many(&ids).await;
        let mut resolved: ProfileMap = hits
            .into_iter()
            .map(|(id, profile)| (id, profile.from_cache()))
            .collect();

        if misses.is_empty() {
            debug!(requested = ids.len(), "All profiles served from cache");
            return resolved;
        }

        let fetched = self.fetch_uncached(&misses).await;
        self.cache
            .set_many(fetched.iter().map(|(id, profile)| (id.clone(), profile.clone())))
            .await;

        for (_, profile) in &fetched {
            counter!("resolutions_total", "kind" => "profile", "origin" => profile.origin.as_str())
                .increment(1);
        }
        resolved.extend(fetched);

        debug!(
            requested = ids.len(),
            cached = ids.len() - misses.len(),
            fetched = misses.len(),
            "Resolved profiles"
        );

        resolved
    }

    /// Resolve a single id; an empty id resolves to a placeholder
    pub async fn resolve_profile(&self, id: &str) -> Resolved<UserProfile> {
        self.resolve_profiles([id])
            .await
            .remove(id)
            .unwrap_or_else(|| Resolved::fallback(UserProfile::placeholder(id)))
    }

    /// Drop the cached profile for `id` so the next lookup hits the store
    pub async fn invalidate(&self, id: &str) {
        self.cache.invalidate(id).await;
    }

    /// Fetch `ids` in one query and fill any gaps with placeholders
    async fn fetch_uncached(&self, ids: &[String]) -> Vec<(String, Resolved<UserProfile>)> {
        let mut found: HashMap<String, UserProfile> = match self.store.fetch_profiles(ids).await {
            Ok(profiles) => profiles
                .into_iter()
                .map(|profile| (profile.id.clone(), profile))
                .collect(),
            Err(e) => {
                warn!(
                    error = %e,
                    ids = ids.len(),
                    "Profile fetch failed, using placeholders"
                );
                counter!("store_errors_total", "operation" => "fetch_profiles").increment(1);
                HashMap::new()
            }
        };

        ids.iter()
            .map(|id| {
                let profile = match found.remove(id) {
                    Some(profile) => Resolved::from_store(profile),
                    None => Resolved::fallback(UserProfile::placeholder(id.as_str())),
                };
                (id.clone(), profile)
            })
            .collect()
    }
}
