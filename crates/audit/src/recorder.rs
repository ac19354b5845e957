//! Appends audit change records and serves paginated queries over them.

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use gatehouse_core::Pagination;

use crate::entry::{AuditEntry, AuditFilter, AuditPage, AuditRecord, NewAudit};
use crate::store::{AuditStoreError, AuditTrailStore};

/// Best-effort, non-blocking audit recorder.
///
/// Same failure-isolation contract as the activity recorder: [`Self::record`]
/// absorbs every persistence error so the mutation being audited is never
/// blocked or rolled back by log-store health.
#[derive(Debug, Clone)]
pub struct AuditRecorder<S> {
    store: S,
}

impl<S> AuditRecorder<S>
where
    S: AuditTrailStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a change, absorbing every failure.
    pub async fn record(&self, audit: NewAudit) {
        if let Err(e) = self.try_record(audit).await {
            error!(error = %e, "failed to record audit entry");
        }
    }

    /// Record a change, surfacing the store outcome.
    pub async fn try_record(&self, audit: NewAudit) -> Result<(), AuditStoreError> {
        let changes = match &audit.changes {
            Some(set) => Some(
                serde_json::to_string(set).map_err(|e| AuditStoreError::Encode(e.to_string()))?,
            ),
            None => None,
        };

        let record = AuditRecord {
            id: Uuid::now_v7(),
            user_id: audit.user_id,
            organization_id: audit.organization_id,
            action: audit.action,
            resource_type: audit.resource_type,
            resource_id: audit.resource_id,
            changes,
            reason: audit.reason,
            ip_address: audit.ip_address,
            user_agent: audit.user_agent,
            created_at: Utc::now(),
        };

        self.store.insert(&record).await
    }

    /// Entries matching `filter`, newest first, plus the filter-wide total.
    pub async fn query(
        &self,
        filter: &AuditFilter,
        page: Pagination,
    ) -> Result<AuditPage, AuditStoreError> {
        let total = self.store.count(filter).await?;
        let records = self.store.find_many(filter, page).await?;
        let entries = records.into_iter().map(decode_record).collect();
        Ok(AuditPage { entries, total })
    }
}

/// Decode the stored change blob, degrading a corrupt blob to `None` for that
/// entry only.
fn decode_record(record: AuditRecord) -> AuditEntry {
    let changes = record.changes.as_deref().and_then(|blob| {
        match serde_json::from_str(blob) {
            Ok(set) => Some(set),
            Err(e) => {
                warn!(entry_id = %record.id, error = %e, "discarding undecodable audit change set");
                None
            }
        }
    });

    AuditEntry {
        id: record.id,
        user_id: record.user_id,
        organization_id: record.organization_id,
        action: record.action,
        resource_type: record.resource_type,
        resource_id: record.resource_id,
        changes,
        reason: record.reason,
        ip_address: record.ip_address,
        user_agent: record.user_agent,
        created_at: record.created_at,
    }
}
