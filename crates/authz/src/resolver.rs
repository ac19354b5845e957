//! Permission resolution and the access guard.
//!
//! [`PermissionResolver::resolve`] is a pure read: the same
//! (user, organization, resource, action) against an unchanged catalog and
//! membership always yields the same answer, so it is safe under unbounded
//! concurrency. [`PermissionResolver::require_permission`] is the sole gate a
//! mutating caller passes through, strictly before the mutation.

use thiserror::Error;

use gatehouse_core::{OrganizationId, UserId};

use crate::model::{PermissionId, Scope};
use crate::role::Role;
use crate::store::{AuthzStoreError, MembershipStore, PermissionStore, RolePermissionStore};

/// The wildcard action: a `<resource>.manage` grant implies every action on
/// that resource.
const MANAGE_ACTION: &str = "manage";

/// Access failure surfaced to callers.
///
/// `Denied` is the only failure class in this core that is allowed to abort a
/// caller's operation; it is surfaced to the end user as an access-denied
/// response and never retried automatically.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("permission denied: {resource}.{action}")]
    Denied { resource: String, action: String },

    #[error(transparent)]
    Store(#[from] AuthzStoreError),
}

/// Resolves (user, organization, resource, action) to a grant/deny decision.
#[derive(Debug, Clone)]
pub struct PermissionResolver<M, P, R> {
    memberships: M,
    permissions: P,
    role_permissions: R,
}

impl<M, P, R> PermissionResolver<M, P, R>
where
    M: MembershipStore,
    P: PermissionStore,
    R: RolePermissionStore,
{
    pub fn new(memberships: M, permissions: P, role_permissions: R) -> Self {
        Self {
            memberships,
            permissions,
            role_permissions,
        }
    }

    /// Decide whether `user_id` may perform `action` on `resource` within
    /// `organization_id`.
    ///
    /// Deny-by-default: a missing membership, an uncatalogued permission, or
    /// an absent grant all resolve to `Ok(false)` — a denial, not an error.
    pub async fn resolve(
        &self,
        user_id: UserId,
        organization_id: Option<OrganizationId>,
        resource: &str,
        action: &str,
    ) -> Result<bool, AuthzStoreError> {
        let role = match organization_id {
            Some(org) => self.memberships.role_of(user_id, org).await?,
            None => None,
        };
        let Some(role) = role else {
            return Ok(false);
        };

        let exact = format!("{resource}.{action}");
        if let Some(permission) = self.permissions.find_by_name(&exact).await? {
            if self
                .grant_exists(&role, permission.id, organization_id)
                .await?
            {
                return Ok(true);
            }
        }

        // Wildcard fallback. Checked even when the exact permission is
        // catalogued: an ungranted exact entry must not mask a manage grant.
        if action != MANAGE_ACTION {
            let wildcard = format!("{resource}.{MANAGE_ACTION}");
            if let Some(permission) = self.permissions.find_by_name(&wildcard).await? {
                if self
                    .grant_exists(&role, permission.id, organization_id)
                    .await?
                {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// The access guard. Must happen-before any state mutation in a caller.
    ///
    /// Returns normally (no side effect) on grant; fails with
    /// [`AccessError::Denied`] otherwise.
    pub async fn require_permission(
        &self,
        user_id: UserId,
        organization_id: Option<OrganizationId>,
        resource: &str,
        action: &str,
    ) -> Result<(), AccessError> {
        if self
            .resolve(user_id, organization_id, resource, action)
            .await?
        {
            Ok(())
        } else {
            Err(AccessError::Denied {
                resource: resource.to_string(),
                action: action.to_string(),
            })
        }
    }

    /// Grant lookup: the organization scope first (when one is in the
    /// request), then one explicit global lookup so that globally seeded
    /// defaults apply inside every organization. The store itself stays
    /// exact-match on scope.
    async fn grant_exists(
        &self,
        role: &Role,
        permission_id: PermissionId,
        organization_id: Option<OrganizationId>,
    ) -> Result<bool, AuthzStoreError> {
        if let Some(org) = organization_id {
            if self
                .role_permissions
                .find_one(role, permission_id, Scope::Organization(org))
                .await?
                .is_some()
            {
                return Ok(true);
            }
        }

        Ok(self
            .role_permissions
            .find_one(role, permission_id, Scope::Global)
            .await?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ensure_seeded, CatalogConfig};
    use crate::test_support::{MemoryMemberships, MemoryPermissions, MemoryRolePermissions};
    use std::sync::Arc;

    type TestResolver = PermissionResolver<
        Arc<MemoryMemberships>,
        Arc<MemoryPermissions>,
        Arc<MemoryRolePermissions>,
    >;

    async fn seeded_resolver() -> (
        TestResolver,
        Arc<MemoryMemberships>,
        Arc<MemoryPermissions>,
        Arc<MemoryRolePermissions>,
    ) {
        let memberships = Arc::new(MemoryMemberships::default());
        let permissions = Arc::new(MemoryPermissions::default());
        let grants = Arc::new(MemoryRolePermissions::default());

        ensure_seeded(&CatalogConfig::default_catalog(), &*permissions, &*grants)
            .await
            .unwrap();

        let resolver = PermissionResolver::new(
            memberships.clone(),
            permissions.clone(),
            grants.clone(),
        );
        (resolver, memberships, permissions, grants)
    }

    #[tokio::test]
    async fn owner_updates_organization_via_manage_wildcard() {
        let (resolver, memberships, _, _) = seeded_resolver().await;
        let user = UserId::new();
        let org = OrganizationId::new();
        memberships.set_role(user, org, Role::from("owner"));

        // The owner holds no organization.update grant, only the global
        // organization.manage wildcard.
        assert!(resolver
            .resolve(user, Some(org), "organization", "update")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn admin_has_explicit_grant_without_wildcard() {
        let (resolver, memberships, _, _) = seeded_resolver().await;
        let user = UserId::new();
        let org = OrganizationId::new();
        memberships.set_role(user, org, Role::from("admin"));

        assert!(resolver
            .resolve(user, Some(org), "organization", "update")
            .await
            .unwrap());
        // No organization.manage and no organization.delete grant for admin.
        assert!(!resolver
            .resolve(user, Some(org), "organization", "delete")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn missing_membership_denies_regardless_of_catalog() {
        let (resolver, _, _, _) = seeded_resolver().await;
        let stranger = UserId::new();
        let org = OrganizationId::new();

        assert!(!resolver
            .resolve(stranger, Some(org), "organization", "read")
            .await
            .unwrap());
        assert!(!resolver
            .resolve(stranger, None, "organization", "read")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn member_without_delete_or_manage_is_denied() {
        let (resolver, memberships, _, _) = seeded_resolver().await;
        let user = UserId::new();
        let org = OrganizationId::new();
        memberships.set_role(user, org, Role::from("member"));

        let err = resolver
            .require_permission(user, Some(org), "member", "delete")
            .await
            .unwrap_err();

        match err {
            AccessError::Denied { resource, action } => {
                assert_eq!(resource, "member");
                assert_eq!(action, "delete");
            }
            other => panic!("expected Denied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn require_permission_is_silent_on_grant() {
        let (resolver, memberships, _, _) = seeded_resolver().await;
        let user = UserId::new();
        let org = OrganizationId::new();
        memberships.set_role(user, org, Role::from("member"));

        resolver
            .require_permission(user, Some(org), "team", "read")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn org_scoped_grant_does_not_leak_to_other_organizations() {
        let (resolver, memberships, permissions, grants) = seeded_resolver().await;
        let user = UserId::new();
        let org_a = OrganizationId::new();
        let org_b = OrganizationId::new();
        memberships.set_role(user, org_a, Role::from("member"));
        memberships.set_role(user, org_b, Role::from("member"));

        // Grant team.update to members in org A only.
        let permission = permissions.find_by_name("team.update").await.unwrap().unwrap();
        grants
            .upsert_if_absent(
                &Role::from("member"),
                permission.id,
                Scope::Organization(org_a),
            )
            .await
            .unwrap();

        assert!(resolver
            .resolve(user, Some(org_a), "team", "update")
            .await
            .unwrap());
        assert!(!resolver
            .resolve(user, Some(org_b), "team", "update")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn resolution_is_deterministic() {
        let (resolver, memberships, _, _) = seeded_resolver().await;
        let user = UserId::new();
        let org = OrganizationId::new();
        memberships.set_role(user, org, Role::from("admin"));

        for _ in 0..10 {
            assert!(resolver
                .resolve(user, Some(org), "member", "read")
                .await
                .unwrap());
            assert!(!resolver
                .resolve(user, Some(org), "organization", "manage")
                .await
                .unwrap());
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: any (role, resource, action) outside the seeded map
            /// with no matching wildcard grant is denied.
            #[test]
            fn unseeded_triples_are_denied(
                role in "[a-z]{1,12}",
                resource in "[a-z]{1,12}",
                action in "[a-z]{1,12}",
            ) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();

                runtime.block_on(async {
                    let (resolver, memberships, _, _) = seeded_resolver().await;
                    let user = UserId::new();
                    let org = OrganizationId::new();
                    memberships.set_role(user, org, Role::from(role.clone()));

                    // Skip the triples the default catalog actually grants.
                    let catalog = CatalogConfig::default_catalog();
                    let granted = catalog.grants.iter().any(|g| {
                        g.role.as_str() == role
                            && g.permissions.iter().any(|p| {
                                *p == format!("{resource}.{action}")
                                    || *p == format!("{resource}.manage")
                            })
                    });
                    prop_assume!(!granted);

                    let allowed = resolver
                        .resolve(user, Some(org), &resource, &action)
                        .await
                        .unwrap();
                    prop_assert!(!allowed);
                    Ok(())
                })?;
            }
        }
    }
}
