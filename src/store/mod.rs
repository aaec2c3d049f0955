//! Persistent profile and role store
//!
//! The resolvers only ever talk to a [`ProfileStore`]. Two backends exist:
//! an in-memory map (tests, local runs) and an embedded SurrealDB engine.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Role, UserProfile};

pub mod memory;
pub mod surreal;

pub use memory::InMemoryProfileStore;
pub use surreal::SurrealProfileStore;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Store health status
#[derive(Debug, Clone, PartialEq)]
pub enum StoreHealth {
    Healthy,
    Unhealthy(String),
}

impl StoreHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, StoreHealth::Healthy)
    }
}

/// Backing store for user profiles and roles
///
/// Failures are reported, never hidden; recovering from them is the
/// resolvers' job.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch every profile whose id is in `ids` with a single query.
    /// Ids with no profile are simply absent from the result.
    async fn fetch_profiles(&self, ids: &[String]) -> Result<Vec<UserProfile>, StoreError>;

    /// Fetch the role row for one user, `None` if the user has no row
    async fn fetch_role(&self, user_id: &str) -> Result<Option<Role>, StoreError>;

    async fn health_check(&self) -> StoreHealth;
}

/// One role row in a seed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: String,
    pub role: Role,
}

/// Initial store contents loaded at startup
///
/// ```json
/// {
///   "profiles": [{ "id": "u1", "display_name": "Ada", "avatar_url": null }],
///   "roles": [{ "user_id": "u1", "role": "admin" }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub profiles: Vec<UserProfile>,
    #[serde(default)]
    pub roles: Vec<RoleAssignment>,
}

impl StoreSeed {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read seed file {}: {}", path.display(), e))?;
        let seed = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid seed file {}: {}", path.display(), e))?;
        Ok(seed)
    }
}
