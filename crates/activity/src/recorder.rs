//! Appends activity traces and serves paginated queries over them.

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use gatehouse_core::Pagination;

use crate::entry::{ActivityEntry, ActivityFilter, ActivityPage, ActivityRecord, NewActivity};
use crate::store::{ActivityLogStore, ActivityStoreError};

/// Best-effort, non-blocking activity recorder.
#[derive(Debug, Clone)]
pub struct ActivityRecorder<S> {
    store: S,
}

impl<S> ActivityRecorder<S>
where
    S: ActivityLogStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record an action trace, absorbing every failure.
    ///
    /// The failure isolation contract: whatever the store's health, this call
    /// returns normally. Errors are reported to operational telemetry and
    /// dropped, so an outage in the log store can never block or roll back
    /// the operation being traced. Use [`Self::try_record`] when the outcome
    /// matters (tests, backfills).
    pub async fn record(&self, activity: NewActivity) {
        if let Err(e) = self.try_record(activity).await {
            error!(error = %e, "failed to record activity");
        }
    }

    /// Record an action trace, surfacing the store outcome.
    pub async fn try_record(&self, activity: NewActivity) -> Result<(), ActivityStoreError> {
        let metadata = match &activity.metadata {
            Some(map) => Some(
                serde_json::to_string(map)
                    .map_err(|e| ActivityStoreError::Encode(e.to_string()))?,
            ),
            None => None,
        };

        let record = ActivityRecord {
            id: Uuid::now_v7(),
            user_id: activity.user_id,
            organization_id: activity.organization_id,
            action: activity.action,
            resource_type: activity.resource_type,
            resource_id: activity.resource_id,
            description: activity.description,
            metadata,
            ip_address: activity.ip_address,
            user_agent: activity.user_agent,
            created_at: Utc::now(),
        };

        self.store.insert(&record).await
    }

    /// Entries matching `filter`, newest first, plus the filter-wide total.
    pub async fn query(
        &self,
        filter: &ActivityFilter,
        page: Pagination,
    ) -> Result<ActivityPage, ActivityStoreError> {
        let total = self.store.count(filter).await?;
        let records = self.store.find_many(filter, page).await?;
        let entries = records.into_iter().map(decode_record).collect();
        Ok(ActivityPage { entries, total })
    }
}

/// Decode the stored metadata blob, degrading a corrupt blob to `None` for
/// that entry only.
fn decode_record(record: ActivityRecord) -> ActivityEntry {
    let metadata = record.metadata.as_deref().and_then(|blob| {
        match serde_json::from_str(blob) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!(entry_id = %record.id, error = %e, "discarding undecodable activity metadata");
                None
            }
        }
    });

    ActivityEntry {
        id: record.id,
        user_id: record.user_id,
        organization_id: record.organization_id,
        action: record.action,
        resource_type: record.resource_type,
        resource_id: record.resource_id,
        description: record.description,
        metadata,
        ip_address: record.ip_address,
        user_agent: record.user_agent,
        created_at: record.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gatehouse_core::UserId;
    use serde_json::json;
    use std::sync::RwLock;

    /// Minimal in-crate store double; the production implementations live in
    /// `gatehouse-infra`.
    #[derive(Debug, Default)]
    struct VecStore {
        rows: RwLock<Vec<ActivityRecord>>,
    }

    impl VecStore {
        fn matches(filter: &ActivityFilter, record: &ActivityRecord) -> bool {
            filter
                .organization_id
                .is_none_or(|org| record.organization_id == Some(org))
                && filter.user_id.is_none_or(|user| record.user_id == user)
        }
    }

    #[async_trait]
    impl ActivityLogStore for VecStore {
        async fn insert(&self, record: &ActivityRecord) -> Result<(), ActivityStoreError> {
            self.rows.write().unwrap().push(record.clone());
            Ok(())
        }

        async fn find_many(
            &self,
            filter: &ActivityFilter,
            page: Pagination,
        ) -> Result<Vec<ActivityRecord>, ActivityStoreError> {
            let rows = self.rows.read().unwrap();
            let mut matching: Vec<ActivityRecord> = rows
                .iter()
                .filter(|r| Self::matches(filter, r))
                .cloned()
                .collect();
            matching.reverse(); // insertion order stands in for created_at desc
            Ok(matching
                .into_iter()
                .skip(page.offset as usize)
                .take(page.limit as usize)
                .collect())
        }

        async fn count(&self, filter: &ActivityFilter) -> Result<u64, ActivityStoreError> {
            let rows = self.rows.read().unwrap();
            Ok(rows.iter().filter(|r| Self::matches(filter, r)).count() as u64)
        }
    }

    /// Store double whose every write fails.
    struct BrokenStore;

    #[async_trait]
    impl ActivityLogStore for BrokenStore {
        async fn insert(&self, _record: &ActivityRecord) -> Result<(), ActivityStoreError> {
            Err(ActivityStoreError::Storage("connection refused".to_string()))
        }

        async fn find_many(
            &self,
            _filter: &ActivityFilter,
            _page: Pagination,
        ) -> Result<Vec<ActivityRecord>, ActivityStoreError> {
            Err(ActivityStoreError::Storage("connection refused".to_string()))
        }

        async fn count(&self, _filter: &ActivityFilter) -> Result<u64, ActivityStoreError> {
            Err(ActivityStoreError::Storage("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn record_swallows_store_failures() {
        let recorder = ActivityRecorder::new(BrokenStore);

        // Must return normally within the call, not raise.
        recorder
            .record(NewActivity::new(UserId::new(), "organization.update"))
            .await;

        // The explicit form still reports the failure.
        let err = recorder
            .try_record(NewActivity::new(UserId::new(), "organization.update"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActivityStoreError::Storage(_)));
    }

    #[tokio::test]
    async fn metadata_round_trips_through_the_blob() {
        let recorder = ActivityRecorder::new(VecStore::default());
        let user = UserId::new();

        let mut metadata = serde_json::Map::new();
        metadata.insert("team".to_string(), json!("platform"));
        metadata.insert("seats".to_string(), json!(7));

        recorder
            .try_record(NewActivity::new(user, "team.update").metadata(metadata.clone()))
            .await
            .unwrap();

        let page = recorder
            .query(&ActivityFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].metadata.as_ref(), Some(&metadata));
    }

    #[tokio::test]
    async fn corrupt_metadata_degrades_to_none_per_row() {
        let store = VecStore::default();

        store
            .insert(&ActivityRecord {
                id: Uuid::now_v7(),
                user_id: UserId::new(),
                organization_id: None,
                action: "team.update".to_string(),
                resource_type: None,
                resource_id: None,
                description: None,
                metadata: Some("{not json".to_string()),
                ip_address: None,
                user_agent: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let recorder = ActivityRecorder::new(store);
        let user = UserId::new();
        let mut metadata = serde_json::Map::new();
        metadata.insert("ok".to_string(), json!(true));
        recorder
            .try_record(NewActivity::new(user, "team.read").metadata(metadata.clone()))
            .await
            .unwrap();

        let page = recorder
            .query(&ActivityFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        // Newest first: the healthy row decodes, the corrupt one degrades.
        assert_eq!(page.entries[0].metadata.as_ref(), Some(&metadata));
        assert_eq!(page.entries[1].metadata, None);
    }

    #[tokio::test]
    async fn query_filters_by_user_and_organization() {
        let recorder = ActivityRecorder::new(VecStore::default());
        let alice = UserId::new();
        let bob = UserId::new();
        let org = gatehouse_core::OrganizationId::new();

        recorder
            .try_record(NewActivity::new(alice, "team.create").organization(org))
            .await
            .unwrap();
        recorder
            .try_record(NewActivity::new(bob, "team.read").organization(org))
            .await
            .unwrap();
        recorder
            .try_record(NewActivity::new(alice, "organization.read"))
            .await
            .unwrap();

        let by_user = recorder
            .query(
                &ActivityFilter {
                    user_id: Some(alice),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_user.total, 2);

        let by_org = recorder
            .query(
                &ActivityFilter {
                    organization_id: Some(org),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_org.total, 2);
        assert!(by_org
            .entries
            .iter()
            .all(|e| e.organization_id == Some(org)));
    }
}
