//! PostgreSQL audit log repository
//!
//! Filters run inside the database against the JSONB document, so the
//! per-invocation pre-clear is a single `DELETE`.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::debug;

use crate::domain::audit::{AuditEntry, AuditLogQuery, AuditLogRepository};
use crate::domain::storage::Storage;
use crate::domain::DomainError;
use crate::infrastructure::storage::PostgresStorage;

/// Rows match on the document's `workflow_id`, and on `level` when `$2` is set
const QUERY_FILTER: &str =
    "data->>'workflow_id' = $1 AND ($2::text IS NULL OR data->>'level' = $2)";

#[derive(Debug)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
    table_name: String,
    storage: PostgresStorage<AuditEntry>,
}

impl PostgresAuditLogRepository {
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();

        Self {
            storage: PostgresStorage::new(pool.clone(), table_name.clone()),
            pool,
            table_name,
        }
    }

    fn delete_matching_sql(&self) -> String {
        format!(
            "DELETE FROM {} WHERE data->>'workflow_id' = $1 AND data->>'message' = $2",
            self.table_name
        )
    }

    fn delete_for_workflow_sql(&self) -> String {
        format!(
            "DELETE FROM {} WHERE data->>'workflow_id' = $1",
            self.table_name
        )
    }

    fn list_sql(&self) -> String {
        format!(
            "SELECT data FROM {} WHERE {} \
             ORDER BY (data->>'created_at')::timestamptz DESC LIMIT $3 OFFSET $4",
            self.table_name, QUERY_FILTER
        )
    }

    fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) AS count FROM {} WHERE {}",
            self.table_name, QUERY_FILTER
        )
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn insert(&self, entry: AuditEntry) -> Result<AuditEntry, DomainError> {
        debug!(
            workflow_id = %entry.workflow_id(),
            level = %entry.level(),
            message = %entry.message(),
            "Recording audit entry"
        );

        self.storage.create(entry).await
    }

    async fn delete_matching(
        &self,
        workflow_id: &str,
        message: &str,
    ) -> Result<usize, DomainError> {
        let result = sqlx::query(&self.delete_matching_sql())
            .bind(workflow_id)
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete audit rows: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }

    async fn list(&self, query: &AuditLogQuery) -> Result<Vec<AuditEntry>, DomainError> {
        let rows = sqlx::query(&self.list_sql())
            .bind(&query.workflow_id)
            .bind(query.level.map(|level| level.as_str()))
            .bind(query.effective_limit() as i64)
            .bind(query.offset.unwrap_or(0) as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list audit rows: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row.get("data")).map_err(|e| {
                    DomainError::storage(format!("Failed to deserialize audit row: {}", e))
                })
            })
            .collect()
    }

    async fn count(&self, query: &AuditLogQuery) -> Result<usize, DomainError> {
        let row = sqlx::query(&self.count_sql())
            .bind(&query.workflow_id)
            .bind(query.level.map(|level| level.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count audit rows: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }

    async fn delete_for_workflow(&self, workflow_id: &str) -> Result<usize, DomainError> {
        let result = sqlx::query(&self.delete_for_workflow_sql())
            .bind(workflow_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete audit rows: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }
}
