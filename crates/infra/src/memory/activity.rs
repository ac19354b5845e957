//! In-memory append-only activity log store.

use std::sync::RwLock;

use async_trait::async_trait;

use gatehouse_activity::{ActivityFilter, ActivityLogStore, ActivityRecord, ActivityStoreError};
use gatehouse_core::Pagination;

fn poisoned() -> ActivityStoreError {
    ActivityStoreError::Storage("lock poisoned".to_string())
}

fn matches(filter: &ActivityFilter, record: &ActivityRecord) -> bool {
    filter
        .organization_id
        .is_none_or(|org| record.organization_id == Some(org))
        && filter.user_id.is_none_or(|user| record.user_id == user)
}

/// In-memory activity log.
///
/// The insertion index is the tie-break under equal timestamps, so the
/// descending `created_at` order stays total even for entries written within
/// the same clock tick.
#[derive(Debug, Default)]
pub struct InMemoryActivityLogStore {
    rows: RwLock<Vec<ActivityRecord>>,
}

impl InMemoryActivityLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityLogStore for InMemoryActivityLogStore {
    async fn insert(&self, record: &ActivityRecord) -> Result<(), ActivityStoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.push(record.clone());
        Ok(())
    }

    async fn find_many(
        &self,
        filter: &ActivityFilter,
        page: Pagination,
    ) -> Result<Vec<ActivityRecord>, ActivityStoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;

        let mut matching: Vec<(usize, &ActivityRecord)> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| matches(filter, r))
            .collect();
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then(seq_b.cmp(seq_a))
        });

        Ok(matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn count(&self, filter: &ActivityFilter) -> Result<u64, ActivityStoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.iter().filter(|r| matches(filter, r)).count() as u64)
    }
}
