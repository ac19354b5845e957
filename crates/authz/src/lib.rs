//! `gatehouse-authz` — scoped role→permission resolution (zero-trust boundary).
//!
//! Every privileged mutation passes through [`PermissionResolver::require_permission`]
//! before touching state. This crate is intentionally decoupled from HTTP and
//! storage: persistence is reached only through the store traits in [`store`].

pub mod catalog;
pub mod model;
pub mod resolver;
pub mod role;
pub mod store;

pub use catalog::{ensure_seeded, CatalogConfig, RoleGrant};
pub use model::{Membership, Permission, PermissionDefinition, PermissionId, RolePermission, Scope};
pub use resolver::{AccessError, PermissionResolver};
pub use role::Role;
pub use store::{AuthzStoreError, MembershipStore, PermissionStore, RolePermissionStore};

#[cfg(test)]
pub(crate) mod test_support;
