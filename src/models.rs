//! Domain records shared by the store, the resolvers and the HTTP layer

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display name given to ids the store could not resolve
pub const PLACEHOLDER_DISPLAY_NAME: &str = "Unknown User";

/// Snapshot of a user's public profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Deterministic stand-in for a profile that could not be found or fetched
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: PLACEHOLDER_DISPLAY_NAME.to_string(),
            avatar_url: None,
        }
    }
}

/// Role tag attached to a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const USER: &'static str = "user";
    pub const ADMIN: &'static str = "admin";

    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    /// Role assumed when none is stored or the store is unreachable
    pub fn user() -> Self {
        Self(Self::USER.to_string())
    }

    pub fn admin() -> Self {
        Self(Self::ADMIN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::user()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a resolved value ultimately came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Read from the persistent store
    Store,
    /// Synthesized because the store had no row or could not be reached
    Fallback,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Store => "store",
            Origin::Fallback => "fallback",
        }
    }
}

/// A resolver result tagged with its provenance
///
/// `origin` survives caching, so a cached placeholder still reports
/// [`Origin::Fallback`]. `cached` is true when this call was served from the
/// cache without touching the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub origin: Origin,
    pub cached: bool,
}

impl<T> Resolved<T> {
    pub fn from_store(value: T) -> Self {
        Self {
            value,
            origin: Origin::Store,
            cached: false,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            origin: Origin::Fallback,
            cached: false,
        }
    }

    pub(crate) fn from_cache(mut self) -> Self {
        self.cached = true;
        self
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
