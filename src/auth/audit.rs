use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// How an authorization decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionPath {
    /// Requester owns the resource
    Owner,
    /// Requester is not the owner but holds the admin role
    Admin,
    /// Neither owner nor admin
    Denied,
}

impl DecisionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionPath::Owner => "owner",
            DecisionPath::Admin => "admin",
            DecisionPath::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub requester_id: String,
    pub owner_id: String,
    pub authorized: bool,
    pub path: DecisionPath,
    pub role_fallback: bool,
}

pub fn audit_authorization_decision(
    requester_id: &str,
    owner_id: &str,
    authorized: bool,
    path: DecisionPath,
    role_fallback: bool,
) -> AuditEntry {
    let entry = AuditEntry {
        timestamp: Utc::now(),
        requester_id: requester_id.to_string(),
        owner_id: owner_id.to_string(),
        authorized,
        path,
        role_fallback,
    };

    info!(
        target: "audit",
        audit_type = "authorization",
        timestamp = %entry.timestamp.to_rfc3339(),
        requester_id = %entry.requester_id,
        owner_id = %entry.owner_id,
        authorized = %entry.authorized,
        path = entry.path.as_str(),
        role_fallback = %entry.role_fallback,
        "Authorization decision"
    );

    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_entry_fields() {
        let entry = audit_authorization_decision("alice", "bob", false, DecisionPath::Denied, true);

        assert_eq!(entry.requester_id, "alice");
        assert_eq!(entry.owner_id, "bob");
        assert!(!entry.authorized);
        assert_eq!(entry.path, DecisionPath::Denied);
        assert!(entry.role_fallback);
    }

    #[test]
    fn test_audit_entry_serializes_path_lowercase() {
        let entry = audit_authorization_decision("alice", "alice", true, DecisionPath::Owner, false);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["path"], "owner");
        assert_eq!(json["authorized"], true);
    }
}
