//! Admin workflow request and response bodies

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::audit::{AuditEntry, AuditLevel};
use crate::domain::invocation::{CallDescriptor, ErrorCategory};
use crate::domain::Workflow;
use crate::infrastructure::services::{CreateWorkflowRequest, UpdateWorkflowRequest};

/// Body of `POST /admin/workflows`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflowBody {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    pub call: CallDescriptor,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

impl From<CreateWorkflowBody> for CreateWorkflowRequest {
    fn from(body: CreateWorkflowBody) -> Self {
        Self {
            id: body.id,
            name: body.name,
            description: body.description,
            worker_id: body.worker_id,
            auth_token: body.auth_token,
            call: body.call,
            variables: body.variables,
        }
    }
}

/// Body of `PUT /admin/workflows/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkflowBody {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub worker_id: Option<String>,
    pub auth_token: Option<String>,
    pub call: Option<CallDescriptor>,
    pub variables: Option<HashMap<String, String>>,
}

impl From<UpdateWorkflowBody> for UpdateWorkflowRequest {
    fn from(body: UpdateWorkflowBody) -> Self {
        Self {
            name: body.name,
            description: body.description,
            worker_id: body.worker_id,
            auth_token: body.auth_token,
            call: body.call,
            variables: body.variables,
        }
    }
}

/// Body of `POST /admin/workflows/{id}/execute`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteWorkflowBody {
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// Query of `GET /admin/workflows/{id}/logs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Workflow as returned by the admin API; the auth token is masked
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub worker_id: String,
    pub auth_token: String,
    pub call: CallDescriptor,
    pub variables: HashMap<String, String>,
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Workflow> for WorkflowResponse {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id().to_string(),
            name: workflow.name().to_string(),
            description: workflow.description().map(String::from),
            worker_id: workflow.worker_id().to_string(),
            auth_token: workflow.masked_auth_token(),
            call: workflow.call().clone(),
            variables: workflow.variables().clone(),
            version: workflow.version(),
            created_at: workflow.created_at().to_rfc3339(),
            updated_at: workflow.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowsListResponse {
    pub workflows: Vec<WorkflowResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryResponse {
    pub id: String,
    pub workflow_id: String,
    pub level: AuditLevel,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorCategory>,
    pub created_at: String,
}

impl From<&AuditEntry> for AuditEntryResponse {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            workflow_id: entry.workflow_id().to_string(),
            level: entry.level(),
            message: entry.message().to_string(),
            details: entry.details().clone(),
            error_kind: entry.error_kind(),
            created_at: entry.created_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditLogsResponse {
    pub logs: Vec<AuditEntryResponse>,
    pub total: usize,
}
