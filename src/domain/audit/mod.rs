//! Audit log domain module

mod entity;
mod repository;

pub use entity::{
    AuditEntry, AuditEntryId, AuditLevel, CONNECT_FAILURE_FALLBACK, FAILURE_PREFIX,
    SUCCESS_MESSAGE,
};
pub use repository::{AuditLogQuery, AuditLogRepository};

#[cfg(test)]
pub use repository::MockAuditLogRepository;
