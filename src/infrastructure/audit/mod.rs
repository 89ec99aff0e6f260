//! Audit log persistence

mod postgres_repository;
mod storage_repository;

pub use postgres_repository::PostgresAuditLogRepository;
pub use storage_repository::StorageAuditLogRepository;
