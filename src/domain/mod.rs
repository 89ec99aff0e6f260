//! Domain layer - Core business logic and entities

pub mod audit;
pub mod error;
pub mod invocation;
pub mod storage;
pub mod workflow;

pub use audit::{AuditEntry, AuditEntryId, AuditLevel, AuditLogQuery, AuditLogRepository};
pub use error::DomainError;
pub use invocation::{
    classify, classify_message, CallDescriptor, Classification, ErrorCategory, HttpMethod,
    InvocationError, InvocationRequest, InvocationResult, Notification, NotificationKind,
    Notifier,
};
pub use storage::{Storage, StorageEntity, StorageKey};
pub use workflow::{Workflow, WorkflowId};
