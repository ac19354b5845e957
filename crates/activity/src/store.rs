//! Activity log storage abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use gatehouse_core::Pagination;

use crate::entry::{ActivityFilter, ActivityRecord};

/// Activity store error.
#[derive(Debug, Clone, Error)]
pub enum ActivityStoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("metadata encoding failed: {0}")]
    Encode(String),
}

/// Append-only activity log store.
///
/// Rows are inserted once and queried many times; implementations never
/// update or delete them.
#[async_trait]
pub trait ActivityLogStore: Send + Sync {
    async fn insert(&self, record: &ActivityRecord) -> Result<(), ActivityStoreError>;

    /// Entries matching `filter`, ordered by `created_at` descending.
    async fn find_many(
        &self,
        filter: &ActivityFilter,
        page: Pagination,
    ) -> Result<Vec<ActivityRecord>, ActivityStoreError>;

    /// Total entries matching `filter`, independent of paging.
    async fn count(&self, filter: &ActivityFilter) -> Result<u64, ActivityStoreError>;
}

#[async_trait]
impl<S> ActivityLogStore for Arc<S>
where
    S: ActivityLogStore + ?Sized,
{
    async fn insert(&self, record: &ActivityRecord) -> Result<(), ActivityStoreError> {
        (**self).insert(record).await
    }

    async fn find_many(
        &self,
        filter: &ActivityFilter,
        page: Pagination,
    ) -> Result<Vec<ActivityRecord>, ActivityStoreError> {
        (**self).find_many(filter, page).await
    }

    async fn count(&self, filter: &ActivityFilter) -> Result<u64, ActivityStoreError> {
        (**self).count(filter).await
    }
}
