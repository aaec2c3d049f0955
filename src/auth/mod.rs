use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod audit;
pub mod components;
pub mod roles;

pub use audit::*;
pub use components::{AccessComponents, AccessStats};
pub use roles::{RoleCache, RoleResolver};

/// Outcome of an ownership-or-admin check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResult {
    pub authorized: bool,
    pub is_admin: bool,
}

/// Decides whether a requester may act on a resource owned by someone else
///
/// Owners are always allowed and never trigger a role lookup. Anyone else
/// is allowed only with the admin role.
#[derive(Clone)]
pub struct Authorizer {
    roles: RoleResolver,
}

impl Authorizer {
    pub fn new(roles: RoleResolver) -> Self {
        Self { roles }
    }

    pub fn roles(&self) -> &RoleResolver {
        &self.roles
    }

    pub async fn check_authorization(
        &self,
        requester_id: &str,
        owner_id: &str,
    ) -> AuthorizationResult {
        if requester_id == owner_id {
            audit_authorization_decision(requester_id, owner_id, true, DecisionPath::Owner, false);
            return self.record(
                DecisionPath::Owner,
                AuthorizationResult {
                    authorized: true,
                    is_admin: false,
                },
            );
        }

        let role = self.roles.resolve_role(requester_id).await;
        let is_admin = role.value.is_admin();
        let path = if is_admin {
            DecisionPath::Admin
        } else {
            DecisionPath::Denied
        };

        debug!(
            requester_id = %requester_id,
            role = %role.value,
            cached = role.cached,
            "Resolved requester role"
        );
        audit_authorization_decision(requester_id, owner_id, is_admin, path, role.is_fallback());

        self.record(
            path,
            AuthorizationResult {
                authorized: is_admin,
                is_admin,
            },
        )
    }

    fn record(&self, path: DecisionPath, result: AuthorizationResult) -> AuthorizationResult {
        counter!("authorization_decisions_total", "path" => path.as_str()).increment(1);
        result
    }
}
