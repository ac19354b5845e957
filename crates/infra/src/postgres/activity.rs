//! Postgres activity log store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use gatehouse_activity::{ActivityFilter, ActivityLogStore, ActivityRecord, ActivityStoreError};
use gatehouse_core::{OrganizationId, Pagination, UserId};

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> ActivityStoreError {
    ActivityStoreError::Storage(format!("sqlx error in {}: {}", operation, err))
}

/// Append-only activity log over the `activity_log` table.
#[derive(Debug, Clone)]
pub struct PostgresActivityLogStore {
    pool: Arc<PgPool>,
}

impl PostgresActivityLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl ActivityLogStore for PostgresActivityLogStore {
    #[instrument(skip(self, record), fields(entry_id = %record.id, action = %record.action), err)]
    async fn insert(&self, record: &ActivityRecord) -> Result<(), ActivityStoreError> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (
                id,
                user_id,
                organization_id,
                action,
                resource_type,
                resource_id,
                description,
                metadata,
                ip_address,
                user_agent,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id.as_uuid())
        .bind(record.organization_id.map(|id| *id.as_uuid()))
        .bind(&record.action)
        .bind(&record.resource_type)
        .bind(&record.resource_id)
        .bind(&record.description)
        .bind(&record.metadata)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_activity", e))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_many(
        &self,
        filter: &ActivityFilter,
        page: Pagination,
    ) -> Result<Vec<ActivityRecord>, ActivityStoreError> {
        let org_param = filter.organization_id.map(|id| *id.as_uuid());
        let user_param = filter.user_id.map(|id| *id.as_uuid());

        // UUIDv7 ids are the tie-break under equal timestamps, keeping the
        // descending order total.
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                user_id,
                organization_id,
                action,
                resource_type,
                resource_id,
                description,
                metadata,
                ip_address,
                user_agent,
                created_at
            FROM activity_log
            WHERE ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(org_param)
        .bind(user_param)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_activity", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = ActivityRow::from_row(&row).map_err(|e| {
                ActivityStoreError::Storage(format!("failed to deserialize activity row: {e}"))
            })?;
            records.push(record.into());
        }
        Ok(records)
    }

    #[instrument(skip(self), err)]
    async fn count(&self, filter: &ActivityFilter) -> Result<u64, ActivityStoreError> {
        let org_param = filter.organization_id.map(|id| *id.as_uuid());
        let user_param = filter.user_id.map(|id| *id.as_uuid());

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as total
            FROM activity_log
            WHERE ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
            "#,
        )
        .bind(org_param)
        .bind(user_param)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_activity", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| ActivityStoreError::Storage(format!("failed to read count: {e}")))?;
        Ok(total as u64)
    }
}

// SQLx row types

#[derive(Debug)]
struct ActivityRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    organization_id: Option<uuid::Uuid>,
    action: String,
    resource_type: Option<String>,
    resource_id: Option<String>,
    description: Option<String>,
    metadata: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ActivityRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ActivityRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            organization_id: row.try_get("organization_id")?,
            action: row.try_get("action")?,
            resource_type: row.try_get("resource_type")?,
            resource_id: row.try_get("resource_id")?,
            description: row.try_get("description")?,
            metadata: row.try_get("metadata")?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ActivityRow> for ActivityRecord {
    fn from(row: ActivityRow) -> Self {
        ActivityRecord {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            organization_id: row.organization_id.map(OrganizationId::from_uuid),
            action: row.action,
            resource_type: row.resource_type,
            resource_id: row.resource_id,
            description: row.description,
            metadata: row.metadata,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        }
    }
}
