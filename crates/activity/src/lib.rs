//! `gatehouse-activity` — best-effort, append-only activity log.
//!
//! The activity log is a human-readable trace of actions, kept for
//! observability. Recording is diagnostic, not transactional: a persistence
//! failure is absorbed at the recorder boundary and must never block or roll
//! back the operation being traced.

pub mod entry;
pub mod recorder;
pub mod store;

pub use entry::{ActivityEntry, ActivityFilter, ActivityPage, ActivityRecord, NewActivity};
pub use recorder::ActivityRecorder;
pub use store::{ActivityLogStore, ActivityStoreError};
