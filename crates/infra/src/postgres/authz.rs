//! Postgres authorization stores.
//!
//! ## Error mapping
//!
//! SQLx errors are mapped to `AuthzStoreError` as follows: a database error
//! with code `23505` (unique violation) becomes `Conflict` — the benign
//! outcome of two processes seeding the catalog at the same time — and
//! everything else becomes `Storage`.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gatehouse_authz::{
    AuthzStoreError, MembershipStore, Permission, PermissionDefinition, PermissionId,
    PermissionStore, Role, RolePermission, RolePermissionStore, Scope,
};
use gatehouse_core::{OrganizationId, UserId};

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> AuthzStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.code().as_deref() == Some("23505") {
                AuthzStoreError::Conflict(msg)
            } else {
                AuthzStoreError::Storage(msg)
            }
        }
        other => AuthzStoreError::Storage(format!("sqlx error in {}: {}", operation, other)),
    }
}

/// Read-only membership lookups against `organization_members`.
#[derive(Debug, Clone)]
pub struct PostgresMembershipStore {
    pool: Arc<PgPool>,
}

impl PostgresMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    #[instrument(
        skip(self),
        fields(user_id = %user_id.as_uuid(), organization_id = %organization_id.as_uuid()),
        err
    )]
    async fn role_of(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<Option<Role>, AuthzStoreError> {
        let row = sqlx::query(
            r#"
            SELECT role
            FROM organization_members
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(organization_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("role_of", e))?;

        match row {
            Some(row) => {
                let role: String = row
                    .try_get("role")
                    .map_err(|e| AuthzStoreError::Storage(format!("failed to read role: {e}")))?;
                Ok(Some(Role::from(role)))
            }
            None => Ok(None),
        }
    }
}

/// Unique-by-name permission catalog in `permissions`.
#[derive(Debug, Clone)]
pub struct PostgresPermissionStore {
    pool: Arc<PgPool>,
}

impl PostgresPermissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl PermissionStore for PostgresPermissionStore {
    #[instrument(skip(self, definition), fields(permission = %definition.name), err)]
    async fn upsert_if_absent(
        &self,
        definition: &PermissionDefinition,
    ) -> Result<(), AuthzStoreError> {
        // DO NOTHING keeps an existing row (and its description) untouched;
        // a racing seeder's duplicate insert is silently absorbed.
        sqlx::query(
            r#"
            INSERT INTO permissions (id, name, resource, action, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(PermissionId::new().as_uuid())
        .bind(&definition.name)
        .bind(&definition.resource)
        .bind(&definition.action)
        .bind(&definition.description)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_permission", e))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, AuthzStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, resource, action, description
            FROM permissions
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_permission", e))?;

        match row {
            Some(row) => {
                let permission = PermissionRow::try_from_row(&row)?;
                Ok(Some(permission.into()))
            }
            None => Ok(None),
        }
    }
}

/// Unique-by-(role, permission, scope) grants in `role_permissions`.
///
/// Global scope is stored as a NULL `organization_id`; lookups use
/// `IS NOT DISTINCT FROM` so NULL compares exactly, never as a wildcard.
#[derive(Debug, Clone)]
pub struct PostgresRolePermissionStore {
    pool: Arc<PgPool>,
}

impl PostgresRolePermissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl RolePermissionStore for PostgresRolePermissionStore {
    #[instrument(
        skip(self),
        fields(role = %role, permission_id = %permission_id, global = scope.is_global()),
        err
    )]
    async fn upsert_if_absent(
        &self,
        role: &Role,
        permission_id: PermissionId,
        scope: Scope,
    ) -> Result<(), AuthzStoreError> {
        let organization_id = scope.organization().map(|id| *id.as_uuid());

        sqlx::query(
            r#"
            INSERT INTO role_permissions (role, permission_id, organization_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (role, permission_id, organization_id) DO NOTHING
            "#,
        )
        .bind(role.as_str())
        .bind(permission_id.as_uuid())
        .bind(organization_id)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_role_permission", e))?;

        Ok(())
    }

    #[instrument(
        skip(self),
        fields(role = %role, permission_id = %permission_id, global = scope.is_global()),
        err
    )]
    async fn find_one(
        &self,
        role: &Role,
        permission_id: PermissionId,
        scope: Scope,
    ) -> Result<Option<RolePermission>, AuthzStoreError> {
        let organization_id = scope.organization().map(|id| *id.as_uuid());

        let row = sqlx::query(
            r#"
            SELECT role, permission_id, organization_id
            FROM role_permissions
            WHERE role = $1
              AND permission_id = $2
              AND organization_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(role.as_str())
        .bind(permission_id.as_uuid())
        .bind(organization_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_role_permission", e))?;

        match row {
            Some(row) => {
                let role: String = row
                    .try_get("role")
                    .map_err(|e| AuthzStoreError::Storage(format!("failed to read role: {e}")))?;
                let permission_id: uuid::Uuid = row.try_get("permission_id").map_err(|e| {
                    AuthzStoreError::Storage(format!("failed to read permission_id: {e}"))
                })?;
                let organization_id: Option<uuid::Uuid> =
                    row.try_get("organization_id").map_err(|e| {
                        AuthzStoreError::Storage(format!("failed to read organization_id: {e}"))
                    })?;

                Ok(Some(RolePermission {
                    role: Role::from(role),
                    permission_id: PermissionId::from_uuid(permission_id),
                    scope: Scope::from_organization(
                        organization_id.map(OrganizationId::from_uuid),
                    ),
                }))
            }
            None => Ok(None),
        }
    }
}

// SQLx row types

#[derive(Debug)]
struct PermissionRow {
    id: uuid::Uuid,
    name: String,
    resource: String,
    action: String,
    description: String,
}

impl PermissionRow {
    fn try_from_row(row: &sqlx::postgres::PgRow) -> Result<Self, AuthzStoreError> {
        let read = |e: sqlx::Error| {
            AuthzStoreError::Storage(format!("failed to deserialize permission row: {e}"))
        };
        Ok(Self {
            id: row.try_get("id").map_err(read)?,
            name: row.try_get("name").map_err(read)?,
            resource: row.try_get("resource").map_err(read)?,
            action: row.try_get("action").map_err(read)?,
            description: row.try_get("description").map_err(read)?,
        })
    }
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Permission {
            id: PermissionId::from_uuid(row.id),
            name: row.name,
            resource: row.resource,
            action: row.action,
            description: row.description,
        }
    }
}
