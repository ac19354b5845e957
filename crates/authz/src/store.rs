//! Storage abstractions consulted by the resolver and the seeder.
//!
//! All store calls are suspending I/O against a shared persistent store;
//! callers must not assume in-memory latency. Implementations live in
//! `gatehouse-infra` (in-memory for tests/dev, Postgres for production).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use gatehouse_core::{OrganizationId, UserId};

use crate::model::{Permission, PermissionDefinition, PermissionId, RolePermission, Scope};
use crate::role::Role;

/// Authorization store error.
#[derive(Debug, Clone, Error)]
pub enum AuthzStoreError {
    /// A uniqueness constraint rejected the write. Benign during concurrent
    /// seeding: the row already exists, which is the desired end state.
    #[error("uniqueness conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Read-only access to organization memberships (owned by code outside this core).
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Role held by `user_id` in `organization_id`, or `None` if not a member.
    async fn role_of(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<Option<Role>, AuthzStoreError>;
}

/// Unique-by-name permission catalog store.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Create the permission if the name is not yet catalogued; a no-op when
    /// it already exists (the stored description is not overwritten).
    async fn upsert_if_absent(
        &self,
        definition: &PermissionDefinition,
    ) -> Result<(), AuthzStoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, AuthzStoreError>;
}

/// Unique-by-(role, permission, scope) grant store.
///
/// Scope matching is strictly exact: global rows never answer
/// organization-scoped lookups and vice versa. Any fallback between scopes is
/// explicit resolver policy, not store behavior.
#[async_trait]
pub trait RolePermissionStore: Send + Sync {
    async fn upsert_if_absent(
        &self,
        role: &Role,
        permission_id: PermissionId,
        scope: Scope,
    ) -> Result<(), AuthzStoreError>;

    async fn find_one(
        &self,
        role: &Role,
        permission_id: PermissionId,
        scope: Scope,
    ) -> Result<Option<RolePermission>, AuthzStoreError>;
}

#[async_trait]
impl<S> MembershipStore for Arc<S>
where
    S: MembershipStore + ?Sized,
{
    async fn role_of(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<Option<Role>, AuthzStoreError> {
        (**self).role_of(user_id, organization_id).await
    }
}

#[async_trait]
impl<S> PermissionStore for Arc<S>
where
    S: PermissionStore + ?Sized,
{
    async fn upsert_if_absent(
        &self,
        definition: &PermissionDefinition,
    ) -> Result<(), AuthzStoreError> {
        (**self).upsert_if_absent(definition).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, AuthzStoreError> {
        (**self).find_by_name(name).await
    }
}

#[async_trait]
impl<S> RolePermissionStore for Arc<S>
where
    S: RolePermissionStore + ?Sized,
{
    async fn upsert_if_absent(
        &self,
        role: &Role,
        permission_id: PermissionId,
        scope: Scope,
    ) -> Result<(), AuthzStoreError> {
        (**self).upsert_if_absent(role, permission_id, scope).await
    }

    async fn find_one(
        &self,
        role: &Role,
        permission_id: PermissionId,
        scope: Scope,
    ) -> Result<Option<RolePermission>, AuthzStoreError> {
        (**self).find_one(role, permission_id, scope).await
    }
}
