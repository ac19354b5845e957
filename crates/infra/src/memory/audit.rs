//! In-memory append-only audit trail store.

use std::sync::RwLock;

use async_trait::async_trait;

use gatehouse_audit::{AuditFilter, AuditRecord, AuditStoreError, AuditTrailStore};
use gatehouse_core::Pagination;

fn poisoned() -> AuditStoreError {
    AuditStoreError::Storage("lock poisoned".to_string())
}

fn matches(filter: &AuditFilter, record: &AuditRecord) -> bool {
    filter
        .organization_id
        .is_none_or(|org| record.organization_id == Some(org))
        && filter
            .resource_type
            .as_deref()
            .is_none_or(|t| record.resource_type == t)
        && filter
            .resource_id
            .as_deref()
            .is_none_or(|i| record.resource_id == i)
}

/// In-memory audit trail with the same total ordering guarantee as the
/// activity store (insertion index breaks `created_at` ties).
#[derive(Debug, Default)]
pub struct InMemoryAuditTrailStore {
    rows: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditTrailStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditTrailStore for InMemoryAuditTrailStore {
    async fn insert(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.push(record.clone());
        Ok(())
    }

    async fn find_many(
        &self,
        filter: &AuditFilter,
        page: Pagination,
    ) -> Result<Vec<AuditRecord>, AuditStoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;

        let mut matching: Vec<(usize, &AuditRecord)> = rows
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

    async fn count(&self, filter: &AuditFilter) -> Result<u64, AuditStoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.iter().filter(|r| matches(filter, r)).count() as u64)
    }
}
