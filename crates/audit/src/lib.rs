//! `gatehouse-audit` — structured before/after change records for compliance.
//!
//! The audit trail records what a privileged mutation changed (before/after
//! snapshots captured by the caller) and why. Like the activity log it is
//! append-only and best-effort: a persistence failure is absorbed at the
//! recorder boundary and never propagates into the mutation that triggered it.

pub mod entry;
pub mod recorder;
pub mod store;

pub use entry::{
    AuditAction, AuditEntry, AuditFilter, AuditPage, AuditRecord, ChangeSet, NewAudit,
};
pub use recorder::AuditRecorder;
pub use store::{AuditStoreError, AuditTrailStore};
