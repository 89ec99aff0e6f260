//! Storage-backed audit log repository

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::audit::{AuditEntry, AuditLogQuery, AuditLogRepository};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Storage-backed implementation of AuditLogRepository
#[derive(Debug)]
pub struct StorageAuditLogRepository {
    storage: Arc<dyn Storage<AuditEntry>>,
}

impl StorageAuditLogRepository {
    pub fn new(storage: Arc<dyn Storage<AuditEntry>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl AuditLogRepository for StorageAuditLogRepository {
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
        let filter = |entry: &AuditEntry| {
            entry.workflow_id() == workflow_id && entry.message() == message
        };

        self.storage.delete_where(&filter).await
    }

    async fn list(&self, query: &AuditLogQuery) -> Result<Vec<AuditEntry>, DomainError> {
        let mut entries: Vec<AuditEntry> = self
            .storage
            .list()
            .await?
            .into_iter()
            .filter(|entry| query.matches(entry))
            .collect();

        entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        Ok(entries
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.effective_limit())
            .collect())
    }

    async fn count(&self, query: &AuditLogQuery) -> Result<usize, DomainError> {
        let entries = self.storage.list().await?;
        Ok(entries.iter().filter(|entry| query.matches(entry)).count())
    }

    async fn delete_for_workflow(&self, workflow_id: &str) -> Result<usize, DomainError> {
        let filter = |entry: &AuditEntry| entry.workflow_id() == workflow_id;

        self.storage.delete_where(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::{AuditLevel, SUCCESS_MESSAGE};
    use crate::infrastructure::storage::InMemoryStorage;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn repository_with(entries: Vec<AuditEntry>) -> StorageAuditLogRepository {
        StorageAuditLogRepository::new(Arc::new(InMemoryStorage::with_entities(entries)))
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let repo = repository_with(vec![]);

        repo.insert(AuditEntry::success("w1", json!({}))).await.unwrap();

        let rows = repo.list(&AuditLogQuery::for_workflow("w1")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message(), SUCCESS_MESSAGE);
    }

    #[tokio::test]
    async fn test_delete_matching_is_exact() {
        let repo = repository_with(vec![
            AuditEntry::success("w1", json!({})),
            AuditEntry::success("w1", json!({})),
            AuditEntry::rejection("w1", 404, "Not Found", json!({})),
            AuditEntry::success("w2", json!({})),
        ]);

        let deleted = repo.delete_matching("w1", SUCCESS_MESSAGE).await.unwrap();
        assert_eq!(deleted, 2);

        let w1 = repo.list(&AuditLogQuery::for_workflow("w1")).await.unwrap();
        assert_eq!(w1.len(), 1);
        assert_eq!(w1[0].level(), AuditLevel::Error);

        let w2 = repo.list(&AuditLogQuery::for_workflow("w2")).await.unwrap();
        assert_eq!(w2.len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_paging() {
        let now = Utc::now();
        let repo = repository_with(vec![
            AuditEntry::failure("w1", "first", None).with_created_at(now - Duration::minutes(2)),
            AuditEntry::failure("w1", "second", None).with_created_at(now - Duration::minutes(1)),
            AuditEntry::failure("w1", "third", None).with_created_at(now),
        ]);

        let rows = repo.list(&AuditLogQuery::for_workflow("w1")).await.unwrap();
        let messages: Vec<&str> = rows.iter().map(|r| r.message()).collect();
        assert_eq!(messages, vec!["third", "second", "first"]);

        let page = repo
            .list(&AuditLogQuery::for_workflow("w1").with_offset(1).with_limit(1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].message(), "second");
    }

    #[tokio::test]
    async fn test_list_filters_by_level() {
        let repo = repository_with(vec![
            AuditEntry::success("w1", json!({})),
            AuditEntry::failure("w1", "boom", None),
        ]);

        let rows = repo
            .list(&AuditLogQuery::for_workflow("w1").with_level(AuditLevel::Info))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].level(), AuditLevel::Info);
    }

    #[tokio::test]
    async fn test_delete_for_workflow() {
        let repo = repository_with(vec![
            AuditEntry::success("w1", json!({})),
            AuditEntry::failure("w1", "boom", None),
            AuditEntry::success("w2", json!({})),
        ]);

        assert_eq!(repo.delete_for_workflow("w1").await.unwrap(), 2);
        assert!(repo.list(&AuditLogQuery::for_workflow("w1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_ignores_paging() {
        let repo = repository_with(vec![
            AuditEntry::success("w1", json!({})),
            AuditEntry::failure("w1", "boom", None),
            AuditEntry::failure("w1", "again", None),
            AuditEntry::failure("w2", "elsewhere", None),
        ]);

        let paged = AuditLogQuery::for_workflow("w1").with_limit(1).with_offset(1);
        assert_eq!(repo.list(&paged).await.unwrap().len(), 1);
        assert_eq!(repo.count(&paged).await.unwrap(), 3);

        let errors = AuditLogQuery::for_workflow("w1").with_level(AuditLevel::Error);
        assert_eq!(repo.count(&errors).await.unwrap(), 2);
    }
}
