//! Audit trail entry shapes.

use core::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use gatehouse_core::{DomainError, OrganizationId, UserId};

/// The kind of mutation an audit entry records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(DomainError::validation(format!(
                "unknown audit action: {other}"
            ))),
        }
    }
}

/// Before/after snapshots of the mutated resource, captured by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<JsonValue>,
}

impl ChangeSet {
    pub fn new(before: Option<JsonValue>, after: Option<JsonValue>) -> Self {
        Self { before, after }
    }
}

/// A change record about to be written. `resource_type`, `resource_id` and
/// `action` are required; the rest is optional context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAudit {
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub changes: Option<ChangeSet>,
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAudit {
    pub fn new(
        user_id: UserId,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            organization_id: None,
            action,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            changes: None,
            reason: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn changes(mut self, changes: ChangeSet) -> Self {
        self.changes = Some(changes);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn client(mut self, ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// The stored shape of an audit entry: the change set is one encoded blob.
///
/// Append-only; never updated or deleted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub changes: Option<String>,
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A queried audit entry with the change blob decoded.
///
/// An undecodable blob degrades to `changes: None` for that entry only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub changes: Option<ChangeSet>,
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filter criteria for audit queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    pub organization_id: Option<OrganizationId>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
}

/// One page of audit entries plus the filter-wide total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPage {
    /// Entries ordered by `created_at` descending.
    pub entries: Vec<AuditEntry>,
    /// Total number of entries matching the filter, independent of paging.
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_action_round_trips_as_text() {
        for action in [AuditAction::Create, AuditAction::Update, AuditAction::Delete] {
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
        assert!("truncate".parse::<AuditAction>().is_err());
    }

    #[test]
    fn change_set_omits_absent_sides() {
        let only_after = ChangeSet::new(None, Some(serde_json::json!({"a": 2})));
        let encoded = serde_json::to_string(&only_after).unwrap();
        assert_eq!(encoded, r#"{"after":{"a":2}}"#);
    }
}
