//! Workflow management admin endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, AuditEntryResponse, AuditLogsResponse, CreateWorkflowBody, ExecuteWorkflowBody,
    Json, LogsQuery, UpdateWorkflowBody, WorkflowResponse, WorkflowsListResponse,
};
use crate::domain::invocation::InvocationResult;

/// GET /admin/workflows
pub async fn list_workflows(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<WorkflowsListResponse>, ApiError> {
    debug!("Admin listing all workflows");

    let workflows = state.workflow_service.list().await?;
    let workflows: Vec<WorkflowResponse> = workflows.iter().map(WorkflowResponse::from).collect();
    let total = workflows.len();

    Ok(Json(WorkflowsListResponse { workflows, total }))
}

/// POST /admin/workflows
pub async fn create_workflow(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(body): Json<CreateWorkflowBody>,
) -> Result<(StatusCode, Json<WorkflowResponse>), ApiError> {
    debug!(workflow_id = %body.id, "Admin creating workflow");

    let workflow = state.workflow_service.create(body.into()).await?;

    Ok((StatusCode::CREATED, Json(WorkflowResponse::from(&workflow))))
}

/// GET /admin/workflows/{workflow_id}
pub async fn get_workflow(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let workflow = state
        .workflow_service
        .get(&workflow_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Workflow '{}' not found", workflow_id)))?;

    Ok(Json(WorkflowResponse::from(&workflow)))
}

/// PUT /admin/workflows/{workflow_id}
pub async fn update_workflow(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(workflow_id): Path<String>,
    Json(body): Json<UpdateWorkflowBody>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    debug!(workflow_id = %workflow_id, "Admin updating workflow");

    let workflow = state
        .workflow_service
        .update(&workflow_id, body.into())
        .await?;

    Ok(Json(WorkflowResponse::from(&workflow)))
}

/// DELETE /admin/workflows/{workflow_id}
pub async fn delete_workflow(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(workflow_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    debug!(workflow_id = %workflow_id, "Admin deleting workflow");

    if !state.workflow_service.delete(&workflow_id).await? {
        return Err(ApiError::not_found(format!(
            "Workflow '{}' not found",
            workflow_id
        )));
    }

    Ok(Json(serde_json::json!({
        "deleted": true,
        "id": workflow_id
    })))
}

/// POST /admin/workflows/{workflow_id}/test
pub async fn test_workflow(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(workflow_id): Path<String>,
) -> Result<Json<InvocationResult>, ApiError> {
    debug!(workflow_id = %workflow_id, "Admin testing workflow call");

    let result = state.workflow_service.test(&workflow_id).await?;

    Ok(Json(result))
}

/// POST /admin/workflows/{workflow_id}/execute
///
/// The body is optional; `{"variables": {...}}` overrides stored variables.
pub async fn execute_workflow(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(workflow_id): Path<String>,
    body: Bytes,
) -> Result<Json<InvocationResult>, ApiError> {
    let body: ExecuteWorkflowBody = if body.iter().all(u8::is_ascii_whitespace) {
        ExecuteWorkflowBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::bad_request(format!("Invalid JSON data: {}", e)).with_code("json_parse_error")
        })?
    };

    debug!(
        workflow_id = %workflow_id,
        extra_variables = body.variables.len(),
        "Admin executing workflow"
    );

    let result = state
        .workflow_service
        .execute(&workflow_id, body.variables)
        .await?;

    Ok(Json(result))
}

/// GET /admin/workflows/{workflow_id}/logs
pub async fn list_workflow_logs(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(workflow_id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<AuditLogsResponse>, ApiError> {
    let entries = state
        .workflow_service
        .logs(&workflow_id, query.limit, query.offset)
        .await?;

    let total = state.workflow_service.log_count(&workflow_id).await?;
    let logs: Vec<AuditEntryResponse> = entries.iter().map(AuditEntryResponse::from).collect();

    Ok(Json(AuditLogsResponse { logs, total }))
}
