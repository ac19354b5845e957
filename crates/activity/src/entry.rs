//! Activity log entry shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use gatehouse_core::{OrganizationId, UserId};

/// An action trace about to be recorded (no id or timestamp yet; the
/// recorder assigns both).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<Map<String, JsonValue>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewActivity {
    pub fn new(user_id: UserId, action: impl Into<String>) -> Self {
        Self {
            user_id,
            organization_id: None,
            action: action.into(),
            resource_type: None,
            resource_id: None,
            description: None,
            metadata: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn resource(mut self, resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn metadata(mut self, metadata: Map<String, JsonValue>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn client(mut self, ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// The stored shape of an activity entry: metadata is one encoded text blob.
///
/// Append-only; never updated or deleted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A queried activity entry with the metadata blob decoded.
///
/// An undecodable blob degrades to `metadata: None` for that entry only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<Map<String, JsonValue>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filter criteria for activity queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFilter {
    pub organization_id: Option<OrganizationId>,
    pub user_id: Option<UserId>,
}

/// One page of activity entries plus the filter-wide total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPage {
    /// Entries ordered by `created_at` descending.
    pub entries: Vec<ActivityEntry>,
    /// Total number of entries matching the filter, independent of paging.
    pub total: u64,
}
