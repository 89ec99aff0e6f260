//! Audit log entry entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::invocation::{classify_message, ErrorCategory};
use crate::domain::storage::{StorageEntity, StorageKey};

/// Message of the info row written after a successful ad hoc test
pub const SUCCESS_MESSAGE: &str = "API request successful";

/// Prefix of the error row written for a non-2xx response
pub const FAILURE_PREFIX: &str = "API request failed: ";

/// Error row message when the failure carried no text
pub const CONNECT_FAILURE_FALLBACK: &str = "Failed to connect to the remote worker API";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEntryId(String);

impl AuditEntryId {
    pub fn generate() -> Self {
        Self(format!("audit-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StorageKey for AuditEntryId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Error,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Info => "info",
            AuditLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuditLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(AuditLevel::Info),
            "error" => Ok(AuditLevel::Error),
            other => Err(format!("Unknown audit level '{}'", other)),
        }
    }
}

/// One recorded invocation attempt
///
/// Rows are append-only. They leave the store through the success pre-clear
/// or when their workflow is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    id: AuditEntryId,
    workflow_id: String,
    level: AuditLevel,
    message: String,
    #[serde(default)]
    details: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        workflow_id: impl Into<String>,
        level: AuditLevel,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: AuditEntryId::generate(),
            workflow_id: workflow_id.into(),
            level,
            message: message.into(),
            details,
            created_at: Utc::now(),
        }
    }

    /// The row marking a successful ad hoc test
    pub fn success(workflow_id: impl Into<String>, details: serde_json::Value) -> Self {
        Self::new(workflow_id, AuditLevel::Info, SUCCESS_MESSAGE, details)
    }

    /// The row recording a non-2xx response
    pub fn rejection(
        workflow_id: impl Into<String>,
        status: u16,
        status_text: &str,
        response: serde_json::Value,
    ) -> Self {
        Self::new(
            workflow_id,
            AuditLevel::Error,
            format!("{}{}", FAILURE_PREFIX, status_text),
            serde_json::json!({
                "status": status,
                "response": response,
            }),
        )
    }

    /// The row recording a failed workflow execution
    pub fn failure(workflow_id: impl Into<String>, message: &str, stack: Option<&str>) -> Self {
        let message = if message.trim().is_empty() {
            CONNECT_FAILURE_FALLBACK
        } else {
            message
        };

        Self::new(
            workflow_id,
            AuditLevel::Error,
            message,
            serde_json::json!({
                "error": message,
                "stack": stack,
            }),
        )
    }

    #[cfg(test)]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &AuditEntryId {
        &self.id
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn level(&self) -> AuditLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &serde_json::Value {
        &self.details
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// What went wrong on an error row
    ///
    /// Rejections carry the worker's status; failure rows only have their
    /// message, so those fall back to scanning it for status codes.
    pub fn error_kind(&self) -> Option<ErrorCategory> {
        if self.level != AuditLevel::Error {
            return None;
        }

        let kind = match self.details.get("status").and_then(|s| s.as_u64()) {
            Some(status) => ErrorCategory::from_status(status as u16),
            None => classify_message(&self.message).error_kind,
        };

        Some(kind)
    }
}

impl StorageEntity for AuditEntry {
    type Key = AuditEntryId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
