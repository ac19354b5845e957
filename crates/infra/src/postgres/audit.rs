//! Postgres audit trail store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use gatehouse_audit::{
    AuditAction, AuditFilter, AuditRecord, AuditStoreError, AuditTrailStore,
};
use gatehouse_core::{OrganizationId, Pagination, UserId};

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> AuditStoreError {
    AuditStoreError::Storage(format!("sqlx error in {}: {}", operation, err))
}

/// Append-only audit trail over the `audit_trail` table.
///
/// The action is stored as its lowercase text form, backed by the table's
/// CHECK constraint.
#[derive(Debug, Clone)]
pub struct PostgresAuditTrailStore {
    pool: Arc<PgPool>,
}

impl PostgresAuditTrailStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl AuditTrailStore for PostgresAuditTrailStore {
    #[instrument(
        skip(self, record),
        fields(entry_id = %record.id, action = %record.action, resource = %record.resource_type),
        err
    )]
    async fn insert(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
        sqlx::query(
            r#"
            INSERT INTO audit_trail (
                id,
                user_id,
                organization_id,
                action,
                resource_type,
                resource_id,
                changes,
                reason,
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
        .bind(record.action.as_str())
        .bind(&record.resource_type)
        .bind(&record.resource_id)
        .bind(&record.changes)
        .bind(&record.reason)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_audit", e))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_many(
        &self,
        filter: &AuditFilter,
        page: Pagination,
    ) -> Result<Vec<AuditRecord>, AuditStoreError> {
        let org_param = filter.organization_id.map(|id| *id.as_uuid());

        let rows = sqlx::query(
            r#"
            SELECT
                id,
                user_id,
                organization_id,
                action,
                resource_type,
                resource_id,
                changes,
                reason,
                ip_address,
                user_agent,
                created_at
            FROM audit_trail
            WHERE ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::text IS NULL OR resource_type = $2)
              AND ($3::text IS NULL OR resource_id = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(org_param)
        .bind(&filter.resource_type)
        .bind(&filter.resource_id)
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_audit", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = AuditRow::from_row(&row).map_err(|e| {
                AuditStoreError::Storage(format!("failed to deserialize audit row: {e}"))
            })?;
            records.push(record.try_into()?);
        }
        Ok(records)
    }

    #[instrument(skip(self), err)]
    async fn count(&self, filter: &AuditFilter) -> Result<u64, AuditStoreError> {
        let org_param = filter.organization_id.map(|id| *id.as_uuid());

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as total
            FROM audit_trail
            WHERE ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::text IS NULL OR resource_type = $2)
              AND ($3::text IS NULL OR resource_id = $3)
            "#,
        )
        .bind(org_param)
        .bind(&filter.resource_type)
        .bind(&filter.resource_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_audit", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| AuditStoreError::Storage(format!("failed to read count: {e}")))?;
        Ok(total as u64)
    }
}

// SQLx row types

#[derive(Debug)]
struct AuditRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    organization_id: Option<uuid::Uuid>,
    action: String,
    resource_type: String,
    resource_id: String,
    changes: Option<String>,
    reason: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for AuditRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(AuditRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            organization_id: row.try_get("organization_id")?,
            action: row.try_get("action")?,
            resource_type: row.try_get("resource_type")?,
            resource_id: row.try_get("resource_id")?,
            changes: row.try_get("changes")?,
            reason: row.try_get("reason")?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<AuditRow> for AuditRecord {
    type Error = AuditStoreError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        // The CHECK constraint keeps the column inside the known set, so a
        // parse failure here means the table was written by something else.
        let action: AuditAction = row
            .action
            .parse()
            .map_err(|e| AuditStoreError::Storage(format!("invalid action column: {e}")))?;

        Ok(AuditRecord {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            organization_id: row.organization_id.map(OrganizationId::from_uuid),
            action,
            resource_type: row.resource_type,
            resource_id: row.resource_id,
            changes: row.changes,
            reason: row.reason,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}
