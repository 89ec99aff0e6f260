//! API request, response and error types

pub mod error;
pub mod json;
pub mod workflow;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use workflow::{
    AuditEntryResponse, AuditLogsResponse, CreateWorkflowBody, ExecuteWorkflowBody, LogsQuery,
    UpdateWorkflowBody, WorkflowResponse, WorkflowsListResponse,
};
