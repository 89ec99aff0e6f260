//! Storage factory for runtime storage selection

use std::sync::Arc;

use tracing::info;

use crate::config::StorageSettings;
use crate::domain::audit::{AuditEntry, AuditLogRepository};
use crate::domain::storage::Storage;
use crate::domain::workflow::Workflow;
use crate::domain::DomainError;
use crate::infrastructure::audit::{PostgresAuditLogRepository, StorageAuditLogRepository};

use super::in_memory::InMemoryStorage;
use super::migrations::run_storage_migrations;
use super::postgres::{PostgresConfig, PostgresStorage};

pub const WORKFLOWS_TABLE: &str = "workflows";
pub const AUDIT_LOGS_TABLE: &str = "audit_logs";

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageBackend {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                other
            ))),
        }
    }
}

/// The document stores the service runs on
///
/// `audit` is the record store over `audit_logs`; on PostgreSQL it filters
/// in SQL instead of scanning documents.
#[derive(Debug, Clone)]
pub struct Stores {
    pub workflows: Arc<dyn Storage<Workflow>>,
    pub audit_logs: Arc<dyn Storage<AuditEntry>>,
    pub audit: Arc<dyn AuditLogRepository>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let audit_logs: Arc<dyn Storage<AuditEntry>> =
            Arc::new(InMemoryStorage::<AuditEntry>::new());

        Self {
            workflows: Arc::new(InMemoryStorage::<Workflow>::new()),
            audit: Arc::new(StorageAuditLogRepository::new(audit_logs.clone())),
            audit_logs,
        }
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Builds the stores for the configured backend; PostgreSQL is migrated first
    pub async fn build(settings: &StorageSettings) -> Result<Stores, DomainError> {
        match StorageBackend::parse(&settings.backend)? {
            StorageBackend::InMemory => {
                info!("Using in-memory storage");
                Ok(Stores::in_memory())
            }
            StorageBackend::Postgres => {
                let url = settings.database_url.as_deref().ok_or_else(|| {
                    DomainError::configuration(
                        "storage.database_url is required for the postgres backend",
                    )
                })?;

                let pool = PostgresConfig::new(url)
                    .with_max_connections(settings.max_connections)
                    .connect()
                    .await?;

                run_storage_migrations(&pool).await?;
                info!(max_connections = settings.max_connections, "Using PostgreSQL storage");

                Ok(Stores {
                    workflows: Arc::new(PostgresStorage::<Workflow>::new(
                        pool.clone(),
                        WORKFLOWS_TABLE,
                    )),
                    audit_logs: Arc::new(PostgresStorage::<AuditEntry>::new(
                        pool.clone(),
                        AUDIT_LOGS_TABLE,
                    )),
                    audit: Arc::new(PostgresAuditLogRepository::new(pool, AUDIT_LOGS_TABLE)),
                })
            }
        }
    }
}
