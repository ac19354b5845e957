//! Catalog and grant records consulted by the resolver.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatehouse_core::{DomainError, OrganizationId, UserId};

use crate::role::Role;

/// Identifier of a catalogued permission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(Uuid);

impl PermissionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl core::fmt::Display for PermissionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PermissionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<PermissionId> for Uuid {
    fn from(value: PermissionId) -> Self {
        value.0
    }
}

impl FromStr for PermissionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("PermissionId: {}", e)))?;
        Ok(Self(uuid))
    }
}

/// A catalogued permission.
///
/// `name` is globally unique and follows `<resource>.<action>` (a few legacy
/// names such as `member.invite` keep their historical spelling while carrying
/// the canonical action in `action`). Immutable after creation; re-seeding an
/// existing name is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: String,
}

/// Seed-time shape of a permission (no id yet; the store assigns one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: String,
}

impl PermissionDefinition {
    pub fn new(
        name: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            action: action.into(),
            description: description.into(),
        }
    }
}

/// The scope at which a role→permission grant applies.
///
/// The canonical store encoding of `Global` is **absence** (SQL `NULL`,
/// in-memory `None`); there is no empty-string sentinel. Scope lookups are
/// exact-match: a global row is only returned for a global query.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Global,
    Organization(OrganizationId),
}

impl Scope {
    pub fn from_organization(organization_id: Option<OrganizationId>) -> Self {
        match organization_id {
            Some(id) => Self::Organization(id),
            None => Self::Global,
        }
    }

    /// Store-boundary encoding: `Global` normalizes to `None`.
    pub fn organization(&self) -> Option<OrganizationId> {
        match self {
            Self::Global => None,
            Self::Organization(id) => Some(*id),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

/// A grant: "this role may perform this permission at this scope."
///
/// Unique per (role, permission_id, scope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role: Role,
    pub permission_id: PermissionId,
    pub scope: Scope,
}

/// A user's membership in an organization (read-only to this crate).
///
/// Memberships are created and mutated by organization-management logic
/// outside this core; the resolver only consults them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_scope_normalizes_to_absence() {
        assert_eq!(Scope::Global.organization(), None);
        assert_eq!(Scope::from_organization(None), Scope::Global);

        let org = OrganizationId::new();
        assert_eq!(Scope::Organization(org).organization(), Some(org));
        assert_eq!(
            Scope::from_organization(Some(org)),
            Scope::Organization(org)
        );
    }
}
