//! In-memory authorization stores.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use gatehouse_authz::{
    AuthzStoreError, MembershipStore, Permission, PermissionDefinition, PermissionId,
    PermissionStore, Role, RolePermission, RolePermissionStore, Scope,
};
use gatehouse_core::{OrganizationId, UserId};

fn poisoned() -> AuthzStoreError {
    AuthzStoreError::Storage("lock poisoned".to_string())
}

/// In-memory membership lookup.
///
/// Memberships are owned by organization-management logic outside this core;
/// `set_role`/`clear_role` exist so tests and dev environments can stand in
/// for it.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    roles: RwLock<HashMap<(UserId, OrganizationId), Role>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role(&self, user_id: UserId, organization_id: OrganizationId, role: Role) {
        if let Ok(mut roles) = self.roles.write() {
            roles.insert((user_id, organization_id), role);
        }
    }

    pub fn clear_role(&self, user_id: UserId, organization_id: OrganizationId) {
        if let Ok(mut roles) = self.roles.write() {
            roles.remove(&(user_id, organization_id));
        }
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn role_of(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<Option<Role>, AuthzStoreError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles.get(&(user_id, organization_id)).cloned())
    }
}

/// In-memory unique-by-name permission catalog.
#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    by_name: RwLock<HashMap<String, Permission>>,
}

impl InMemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of catalogued permissions (test support).
    pub fn len(&self) -> usize {
        self.by_name.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn upsert_if_absent(
        &self,
        definition: &PermissionDefinition,
    ) -> Result<(), AuthzStoreError> {
        let mut by_name = self.by_name.write().map_err(|_| poisoned())?;
        // Check-then-insert under the write lock; existing rows (including
        // their description) are left untouched.
        by_name
            .entry(definition.name.clone())
            .or_insert_with(|| Permission {
                id: PermissionId::new(),
                name: definition.name.clone(),
                resource: definition.resource.clone(),
                action: definition.action.clone(),
                description: definition.description.clone(),
            });
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, AuthzStoreError> {
        let by_name = self.by_name.read().map_err(|_| poisoned())?;
        Ok(by_name.get(name).cloned())
    }
}

/// In-memory unique-by-(role, permission, scope) grant store.
///
/// Scope keys use the canonical encoding: `None` is global. Lookups are
/// exact-match only.
#[derive(Debug, Default)]
pub struct InMemoryRolePermissionStore {
    rows: RwLock<HashMap<(String, PermissionId, Option<OrganizationId>), RolePermission>>,
}

impl InMemoryRolePermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of grants (test support).
    pub fn len(&self) -> usize {
        self.rows.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RolePermissionStore for InMemoryRolePermissionStore {
    async fn upsert_if_absent(
        &self,
        role: &Role,
        permission_id: PermissionId,
        scope: Scope,
    ) -> Result<(), AuthzStoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.entry((role.as_str().to_string(), permission_id, scope.organization()))
            .or_insert_with(|| RolePermission {
                role: role.clone(),
                permission_id,
                scope,
            });
        Ok(())
    }

    async fn find_one(
        &self,
        role: &Role,
        permission_id: PermissionId,
        scope: Scope,
    ) -> Result<Option<RolePermission>, AuthzStoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows
            .get(&(role.as_str().to_string(), permission_id, scope.organization()))
            .cloned())
    }
}
