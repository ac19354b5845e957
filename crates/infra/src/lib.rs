//! Infrastructure layer: store implementations for the authorization core.
//!
//! Two backends for every store trait:
//! - [`memory`] — `RwLock`-guarded maps for tests and development.
//! - [`postgres`] — sqlx-backed production stores.

pub mod memory;
pub mod postgres;
