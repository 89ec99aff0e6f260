//! Audit log repository trait

use async_trait::async_trait;
use serde::Deserialize;

use super::entity::{AuditEntry, AuditLevel};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Default page size when listing audit rows
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Filter for listing a workflow's audit rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuditLogQuery {
    pub workflow_id: String,
    #[serde(default)]
    pub level: Option<AuditLevel>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl AuditLogQuery {
    pub fn for_workflow(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: AuditLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        entry.workflow_id() == self.workflow_id
            && self.level.is_none_or(|level| entry.level() == level)
    }
}

/// Record store for invocation audit rows
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuditLogRepository: Send + Sync + std::fmt::Debug {
    /// Appends a row
    async fn insert(&self, entry: AuditEntry) -> Result<AuditEntry, DomainError>;

    /// Deletes rows whose workflow id and message both match exactly
    async fn delete_matching(&self, workflow_id: &str, message: &str)
    -> Result<usize, DomainError>;

    /// Lists a workflow's rows, newest first
    async fn list(&self, query: &AuditLogQuery) -> Result<Vec<AuditEntry>, DomainError>;

    /// Counts rows matching the query's filters; limit and offset are ignored
    async fn count(&self, query: &AuditLogQuery) -> Result<usize, DomainError>;

    /// Deletes every row of a workflow
    async fn delete_for_workflow(&self, workflow_id: &str) -> Result<usize, DomainError>;
}
