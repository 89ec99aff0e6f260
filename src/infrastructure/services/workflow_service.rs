//! Workflow service - CRUD over workflow records plus test and execute

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::domain::audit::{AuditEntry, AuditLogQuery, AuditLogRepository, SUCCESS_MESSAGE};
use crate::domain::invocation::{
    classify, CallDescriptor, InvocationError, InvocationRequest, InvocationResult, Notification,
    Notifier,
};
use crate::domain::storage::Storage;
use crate::domain::{DomainError, Workflow, WorkflowId};
use crate::infrastructure::invocation::InvocationPipeline;

/// Request to create a new workflow
#[derive(Debug, Clone)]
pub struct CreateWorkflowRequest {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub worker_id: Option<String>,
    pub auth_token: Option<String>,
    pub call: CallDescriptor,
    pub variables: HashMap<String, String>,
}

impl CreateWorkflowRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, call: CallDescriptor) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            worker_id: None,
            auth_token: None,
            call,
            variables: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_credentials(
        mut self,
        worker_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        self.worker_id = Some(worker_id.into());
        self.auth_token = Some(auth_token.into());
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

/// Request to update an existing workflow
#[derive(Debug, Clone, Default)]
pub struct UpdateWorkflowRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub worker_id: Option<String>,
    pub auth_token: Option<String>,
    pub call: Option<CallDescriptor>,
    pub variables: Option<HashMap<String, String>>,
}

impl UpdateWorkflowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }

    pub fn with_auth_token(mut self, auth_token: impl Into<String>) -> Self {
        self.auth_token = Some(auth_token.into());
        self
    }

    pub fn with_call(mut self, call: CallDescriptor) -> Self {
        self.call = Some(call);
        self
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// Failure of a workflow test or execution
#[derive(Debug, Error)]
pub enum WorkflowRunError {
    /// The workflow could not be loaded
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The invocation itself failed
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

/// Workflow service for CRUD operations and invocations
pub struct WorkflowService {
    storage: Arc<dyn Storage<Workflow>>,
    audit: Arc<dyn AuditLogRepository>,
    pipeline: InvocationPipeline,
    notifier: Arc<dyn Notifier>,
    deadline: Option<Duration>,
}

impl std::fmt::Debug for WorkflowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowService")
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl WorkflowService {
    pub fn new(
        storage: Arc<dyn Storage<Workflow>>,
        audit: Arc<dyn AuditLogRepository>,
        pipeline: InvocationPipeline,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            storage,
            audit,
            pipeline,
            notifier,
            deadline: None,
        }
    }

    /// Deadline applied around each test or execution
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn get(&self, id: &str) -> Result<Option<Workflow>, DomainError> {
        let workflow_id = WorkflowId::new(id)?;
        self.storage.get(&workflow_id).await
    }

    /// Lists all workflows ordered by id
    pub async fn list(&self) -> Result<Vec<Workflow>, DomainError> {
        let mut workflows = self.storage.list().await?;
        workflows.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        Ok(workflows)
    }

    pub async fn create(&self, request: CreateWorkflowRequest) -> Result<Workflow, DomainError> {
        let workflow_id = WorkflowId::new(&request.id)?;

        if self.storage.exists(&workflow_id).await? {
            return Err(DomainError::conflict(format!(
                "Workflow '{}' already exists",
                request.id
            )));
        }

        let mut workflow = Workflow::new(workflow_id, request.name, request.call)
            .with_variables(request.variables);

        if let Some(description) = request.description {
            workflow = workflow.with_description(description);
        }

        if let Some(worker_id) = request.worker_id {
            workflow.set_worker_id(worker_id);
        }

        if let Some(auth_token) = request.auth_token {
            workflow.set_auth_token(auth_token);
        }

        workflow.validate()?;

        info!(workflow_id = %workflow.id(), "Creating workflow");
        self.storage.create(workflow).await
    }

    pub async fn update(
        &self,
        id: &str,
        request: UpdateWorkflowRequest,
    ) -> Result<Workflow, DomainError> {
        let mut workflow = self.load(id).await?;

        if let Some(name) = request.name {
            workflow.set_name(name);
        }

        if let Some(description) = request.description {
            workflow.set_description(description);
        }

        if let Some(worker_id) = request.worker_id {
            workflow.set_worker_id(worker_id);
        }

        if let Some(auth_token) = request.auth_token {
            workflow.set_auth_token(auth_token);
        }

        if let Some(call) = request.call {
            workflow.set_call(call);
        }

        if let Some(variables) = request.variables {
            workflow.set_variables(variables);
        }

        workflow.validate()?;

        self.storage.update(workflow).await
    }

    /// Deletes a workflow together with its audit rows
    ///
    /// Audit rows go first; if that fails the workflow is left in place so
    /// the delete can be retried.
    pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let workflow_id = WorkflowId::new(id)?;

        if !self.storage.exists(&workflow_id).await? {
            return Ok(false);
        }

        let removed = self.audit.delete_for_workflow(workflow_id.as_str()).await?;
        let deleted = self.storage.delete(&workflow_id).await?;

        info!(workflow_id = %workflow_id, audit_rows = removed, "Deleted workflow");
        Ok(deleted)
    }

    /// Ad hoc API test of the workflow's call
    pub async fn test(&self, id: &str) -> Result<InvocationResult, WorkflowRunError> {
        let workflow = self.load(id).await?;
        let request = workflow.to_invocation_request(HashMap::new(), false);

        self.run(request).await
    }

    /// Executes the workflow; `extra` overrides stored variables
    pub async fn execute(
        &self,
        id: &str,
        extra: HashMap<String, String>,
    ) -> Result<InvocationResult, WorkflowRunError> {
        let workflow = self.load(id).await?;
        let request = workflow.to_invocation_request(extra, true);

        self.run(request).await
    }

    pub async fn logs(
        &self,
        id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let workflow = self.load(id).await?;

        let query = AuditLogQuery {
            workflow_id: workflow.id().to_string(),
            level: None,
            limit,
            offset,
        };

        self.audit.list(&query).await
    }

    /// Number of audit rows a workflow has, ignoring paging
    pub async fn log_count(&self, id: &str) -> Result<usize, DomainError> {
        let workflow = self.load(id).await?;

        self.audit
            .count(&AuditLogQuery::for_workflow(workflow.id().as_str()))
            .await
    }

    async fn run(
        &self,
        request: InvocationRequest,
    ) -> Result<InvocationResult, WorkflowRunError> {
        match self.pipeline.invoke_within(&request, self.deadline).await {
            Ok(result) => {
                self.notifier.notify(Notification::success(SUCCESS_MESSAGE));
                Ok(result)
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::failure(classify(&e).user_message));
                Err(e.into())
            }
        }
    }

    async fn load(&self, id: &str) -> Result<Workflow, DomainError> {
        let workflow_id = WorkflowId::new(id)?;

        self.storage
            .get(&workflow_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Workflow '{}' not found", id)))
    }
}
