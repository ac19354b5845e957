//! Audit trail storage abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use gatehouse_core::Pagination;

use crate::entry::{AuditFilter, AuditRecord};

/// Audit store error.
#[derive(Debug, Clone, Error)]
pub enum AuditStoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("change set encoding failed: {0}")]
    Encode(String),
}

/// Append-only audit trail store.
///
/// Rows are inserted once and queried many times; implementations never
/// update or delete them.
#[async_trait]
pub trait AuditTrailStore: Send + Sync {
    async fn insert(&self, record: &AuditRecord) -> Result<(), AuditStoreError>;

    /// Entries matching `filter`, ordered by `created_at` descending.
    async fn find_many(
        &self,
        filter: &AuditFilter,
        page: Pagination,
    ) -> Result<Vec<AuditRecord>, AuditStoreError>;

    /// Total entries matching `filter`, independent of paging.
    async fn count(&self, filter: &AuditFilter) -> Result<u64, AuditStoreError>;
}

#[async_trait]
impl<S> AuditTrailStore for Arc<S>
where
    S: AuditTrailStore + ?Sized,
{
    async fn insert(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
        (**self).insert(record).await
    }

    async fn find_many(
        &self,
        filter: &AuditFilter,
        page: Pagination,
    ) -> Result<Vec<AuditRecord>, AuditStoreError> {
        (**self).find_many(filter, page).await
    }

    async fn count(&self, filter: &AuditFilter) -> Result<u64, AuditStoreError> {
        (**self).count(filter).await
    }
}
