//! Permission catalog definition and idempotent seeding.
//!
//! The catalog is passed in as an explicit [`CatalogConfig`] rather than read
//! from module-level state, which keeps seeding testable and reentrant.
//! Seeding runs once at process start, independent of request flow; running it
//! N times yields the same catalog as running it once.

use tracing::{debug, warn};

use crate::model::{PermissionDefinition, Scope};
use crate::role::Role;
use crate::store::{AuthzStoreError, PermissionStore, RolePermissionStore};

/// Permissions a single role is granted (by permission name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: Role,
    pub permissions: Vec<String>,
}

impl RoleGrant {
    pub fn new(role: impl Into<Role>, permissions: &[&str]) -> Self {
        Self {
            role: role.into(),
            permissions: permissions.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// The permission definitions and default role→permission map to seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub permissions: Vec<PermissionDefinition>,
    pub grants: Vec<RoleGrant>,
}

impl CatalogConfig {
    /// The stock catalog: organization / team / member / invitation
    /// permissions and the owner / admin / member grant map.
    pub fn default_catalog() -> Self {
        let def = PermissionDefinition::new;
        Self {
            permissions: vec![
                def("organization.create", "organization", "create", "Create organizations"),
                def("organization.read", "organization", "read", "View organization details"),
                def("organization.update", "organization", "update", "Update organization settings"),
                def("organization.delete", "organization", "delete", "Delete organizations"),
                def("organization.manage", "organization", "manage", "Full organization management"),
                def("team.create", "team", "create", "Create teams"),
                def("team.read", "team", "read", "View teams"),
                def("team.update", "team", "update", "Update teams"),
                def("team.delete", "team", "delete", "Delete teams"),
                def("team.manage", "team", "manage", "Full team management"),
                // Legacy names: the action column carries the canonical verb.
                def("member.invite", "member", "create", "Invite members"),
                def("member.read", "member", "read", "View members"),
                def("member.update", "member", "update", "Update member roles"),
                def("member.remove", "member", "delete", "Remove members"),
                def("member.manage", "member", "manage", "Full member management"),
                def("invitation.create", "invitation", "create", "Create invitations"),
                def("invitation.read", "invitation", "read", "View invitations"),
                def("invitation.cancel", "invitation", "delete", "Cancel invitations"),
            ],
            grants: vec![
                RoleGrant::new(
                    "owner",
                    &[
                        "organization.manage",
                        "team.manage",
                        "member.manage",
                        "invitation.create",
                        "invitation.read",
                        "invitation.cancel",
                    ],
                ),
                RoleGrant::new(
                    "admin",
                    &[
                        "organization.read",
                        "organization.update",
                        "team.manage",
                        "member.invite",
                        "member.read",
                        "member.update",
                        "member.remove",
                        "invitation.create",
                        "invitation.read",
                        "invitation.cancel",
                    ],
                ),
                RoleGrant::new("member", &["organization.read", "team.read", "member.read"]),
            ],
        }
    }

    /// Roles recognized by this catalog (deduplicated, in grant order).
    pub fn recognized_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = Vec::new();
        for grant in &self.grants {
            if !roles.contains(&grant.role) {
                roles.push(grant.role.clone());
            }
        }
        roles
    }
}

/// Seed the permission catalog and the default role grants (at global scope).
///
/// Idempotent: existing permissions are left untouched (descriptions are not
/// overwritten) and existing grants are not duplicated. A uniqueness conflict
/// from a concurrently booting process is the desired end state and is
/// treated as success. A grant naming an undefined permission is skipped with
/// a warning; it never aborts seeding.
pub async fn ensure_seeded<P, R>(
    config: &CatalogConfig,
    permissions: &P,
    role_permissions: &R,
) -> Result<(), AuthzStoreError>
where
    P: PermissionStore + ?Sized,
    R: RolePermissionStore + ?Sized,
{
    for definition in &config.permissions {
        match permissions.upsert_if_absent(definition).await {
            Ok(()) => {}
            Err(AuthzStoreError::Conflict(_)) => {
                // A racing seeder created it first; same catalog either way.
                debug!(permission = %definition.name, "permission already seeded");
            }
            Err(e) => return Err(e),
        }
    }

    for grant in &config.grants {
        for name in &grant.permissions {
            let Some(permission) = permissions.find_by_name(name).await? else {
                warn!(
                    role = %grant.role,
                    permission = %name,
                    "role grant references an undefined permission, skipping"
                );
                continue;
            };

            match role_permissions
                .upsert_if_absent(&grant.role, permission.id, Scope::Global)
                .await
            {
                Ok(()) => {}
                Err(AuthzStoreError::Conflict(_)) => {
                    debug!(role = %grant.role, permission = %name, "grant already seeded");
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PermissionId;
    use crate::test_support::{MemoryPermissions, MemoryRolePermissions};
    use async_trait::async_trait;

    #[tokio::test]
    async fn seeding_twice_yields_one_row_per_name() {
        let permissions = MemoryPermissions::default();
        let grants = MemoryRolePermissions::default();
        let config = CatalogConfig::default_catalog();

        ensure_seeded(&config, &permissions, &grants).await.unwrap();
        let after_first = permissions.len();
        let grants_after_first = grants.len();

        ensure_seeded(&config, &permissions, &grants).await.unwrap();

        assert_eq!(permissions.len(), after_first);
        assert_eq!(grants.len(), grants_after_first);
        assert_eq!(after_first, config.permissions.len());
    }

    #[tokio::test]
    async fn reseed_does_not_overwrite_description() {
        let permissions = MemoryPermissions::default();
        let grants = MemoryRolePermissions::default();

        let mut config = CatalogConfig {
            permissions: vec![PermissionDefinition::new(
                "widget.read",
                "widget",
                "read",
                "original wording",
            )],
            grants: vec![],
        };
        ensure_seeded(&config, &permissions, &grants).await.unwrap();

        config.permissions[0].description = "revised wording".to_string();
        ensure_seeded(&config, &permissions, &grants).await.unwrap();

        let stored = permissions.find_by_name("widget.read").await.unwrap().unwrap();
        assert_eq!(stored.description, "original wording");
    }

    #[tokio::test]
    async fn grant_for_undefined_permission_is_skipped() {
        let permissions = MemoryPermissions::default();
        let grants = MemoryRolePermissions::default();

        let config = CatalogConfig {
            permissions: vec![PermissionDefinition::new(
                "team.read",
                "team",
                "read",
                "View teams",
            )],
            grants: vec![RoleGrant::new("member", &["team.read", "ghost.read"])],
        };

        ensure_seeded(&config, &permissions, &grants).await.unwrap();

        // Only the grant whose permission exists was written.
        assert_eq!(grants.len(), 1);
    }

    /// Store double that reports a uniqueness conflict on every write, as a
    /// second seeder racing through boot would observe.
    struct ConflictingGrants(MemoryRolePermissions);

    #[async_trait]
    impl RolePermissionStore for ConflictingGrants {
        async fn upsert_if_absent(
            &self,
            _role: &Role,
            _permission_id: PermissionId,
            _scope: Scope,
        ) -> Result<(), AuthzStoreError> {
            Err(AuthzStoreError::Conflict("duplicate key".to_string()))
        }

        async fn find_one(
            &self,
            role: &Role,
            permission_id: PermissionId,
            scope: Scope,
        ) -> Result<Option<crate::model::RolePermission>, AuthzStoreError> {
            self.0.find_one(role, permission_id, scope).await
        }
    }

    #[tokio::test]
    async fn seed_conflict_is_treated_as_success() {
        let permissions = MemoryPermissions::default();
        let grants = ConflictingGrants(MemoryRolePermissions::default());
        let config = CatalogConfig::default_catalog();

        ensure_seeded(&config, &permissions, &grants)
            .await
            .expect("conflicts from a racing seeder must not surface");
    }

    #[test]
    fn recognized_roles_come_from_the_grant_map() {
        let config = CatalogConfig::default_catalog();
        let roles = config.recognized_roles();
        assert_eq!(
            roles,
            vec![Role::from("owner"), Role::from("admin"), Role::from("member")]
        );
    }
}
