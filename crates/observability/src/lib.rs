//! Tracing, logging, metrics (shared setup).
//!
//! The recorders report swallowed persistence failures here; nothing in this
//! workspace logs to stdout directly.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
