//! Postgres-backed store implementations (sqlx).
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE permissions (
//!     id          UUID PRIMARY KEY,
//!     name        TEXT NOT NULL UNIQUE,
//!     resource    TEXT NOT NULL,
//!     action      TEXT NOT NULL,
//!     description TEXT NOT NULL
//! );
//!
//! CREATE TABLE role_permissions (
//!     role            TEXT NOT NULL,
//!     permission_id   UUID NOT NULL REFERENCES permissions (id),
//!     organization_id UUID,   -- NULL encodes global scope (canonical)
//!     UNIQUE NULLS NOT DISTINCT (role, permission_id, organization_id)
//! );
//!
//! CREATE TABLE organization_members (
//!     user_id         UUID NOT NULL,
//!     organization_id UUID NOT NULL,
//!     role            TEXT NOT NULL,
//!     UNIQUE (user_id, organization_id)
//! );
//!
//! CREATE TABLE activity_log (
//!     id              UUID PRIMARY KEY,
//!     user_id         UUID NOT NULL,
//!     organization_id UUID,
//!     action          TEXT NOT NULL,
//!     resource_type   TEXT,
//!     resource_id     TEXT,
//!     description     TEXT,
//!     metadata        TEXT,
//!     ip_address      TEXT,
//!     user_agent      TEXT,
//!     created_at      TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE audit_trail (
//!     id              UUID PRIMARY KEY,
//!     user_id         UUID NOT NULL,
//!     organization_id UUID,
//!     action          TEXT NOT NULL CHECK (action IN ('create', 'update', 'delete')),
//!     resource_type   TEXT NOT NULL,
//!     resource_id     TEXT NOT NULL,
//!     changes         TEXT,
//!     reason          TEXT,
//!     ip_address      TEXT,
//!     user_agent      TEXT,
//!     created_at      TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! The log tables are append-only: nothing in this crate issues UPDATE or
//! DELETE against them. `role_permissions` uses `NULLS NOT DISTINCT` so the
//! uniqueness constraint also covers global (NULL-scope) rows, which is what
//! lets concurrent boot seeding race safely.

mod activity;
mod audit;
mod authz;

pub use activity::PostgresActivityLogStore;
pub use audit::PostgresAuditTrailStore;
pub use authz::{
    PostgresMembershipStore, PostgresPermissionStore, PostgresRolePermissionStore,
};
