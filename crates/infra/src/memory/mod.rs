//! In-memory store implementations.
//!
//! Intended for tests/dev. Not optimized for performance.

mod activity;
mod audit;
mod authz;

pub use activity::InMemoryActivityLogStore;
pub use audit::InMemoryAuditTrailStore;
pub use authz::{
    InMemoryMembershipStore, InMemoryPermissionStore, InMemoryRolePermissionStore,
};
