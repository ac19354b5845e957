//! HashMap-backed store doubles for unit tests in this crate.
//!
//! The real in-memory and Postgres implementations live in `gatehouse-infra`;
//! these doubles keep the resolver and seeder tests storage-free.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use gatehouse_core::{OrganizationId, UserId};

use crate::model::{Permission, PermissionDefinition, PermissionId, RolePermission, Scope};
use crate::role::Role;
use crate::store::{
    AuthzStoreError, MembershipStore, PermissionStore, RolePermissionStore,
};

fn poisoned() -> AuthzStoreError {
    AuthzStoreError::Storage("lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub(crate) struct MemoryMemberships {
    roles: RwLock<HashMap<(UserId, OrganizationId), Role>>,
}

impl MemoryMemberships {
    pub(crate) fn set_role(&self, user_id: UserId, organization_id: OrganizationId, role: Role) {
        self.roles
            .write()
            .expect("lock poisoned")
            .insert((user_id, organization_id), role);
    }
}

#[async_trait]
impl MembershipStore for MemoryMemberships {
    async fn role_of(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<Option<Role>, AuthzStoreError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles.get(&(user_id, organization_id)).cloned())
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryPermissions {
    by_name: RwLock<HashMap<String, Permission>>,
}

impl MemoryPermissions {
    pub(crate) fn len(&self) -> usize {
        self.by_name.read().expect("lock poisoned").len()
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissions {
    async fn upsert_if_absent(
        &self,
        definition: &PermissionDefinition,
    ) -> Result<(), AuthzStoreError> {
        let mut by_name = self.by_name.write().map_err(|_| poisoned())?;
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

#[derive(Debug, Default)]
pub(crate) struct MemoryRolePermissions {
    rows: RwLock<HashMap<(Role, PermissionId, Scope), RolePermission>>,
}

impl MemoryRolePermissions {
    pub(crate) fn len(&self) -> usize {
        self.rows.read().expect("lock poisoned").len()
    }
}

#[async_trait]
impl RolePermissionStore for MemoryRolePermissions {
    async fn upsert_if_absent(
        &self,
        role: &Role,
        permission_id: PermissionId,
        scope: Scope,
    ) -> Result<(), AuthzStoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.entry((role.clone(), permission_id, scope))
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
        Ok(rows.get(&(role.clone(), permission_id, scope)).cloned())
    }
}
