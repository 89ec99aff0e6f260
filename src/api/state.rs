//! Application state for shared services

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::domain::audit::AuditEntry;
use crate::domain::invocation::{InvocationResult, Notifier};
use crate::domain::{DomainError, Workflow};
use crate::infrastructure::invocation::{InvocationPipeline, WorkerTransport};
use crate::infrastructure::services::{
    CreateWorkflowRequest, UpdateWorkflowRequest, WorkflowRunError, WorkflowService,
};
use crate::infrastructure::storage::Stores;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub workflow_service: Arc<dyn WorkflowServiceTrait>,
    pub pipeline: InvocationPipeline,
    pub notifier: Arc<dyn Notifier>,
    pub stores: Stores,
    /// Shared secret for `/admin`; open when unset
    pub admin_token: Option<String>,
    /// Deadline around ad hoc invocations
    pub deadline: Option<Duration>,
}

impl AppState {
    /// Wires the services over the given stores and transport
    pub fn new(
        stores: Stores,
        transport: Arc<dyn WorkerTransport>,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> Self {
        let audit = stores.audit.clone();
        let pipeline = InvocationPipeline::new(transport, audit.clone());
        let deadline = config.invocation.deadline();

        let workflow_service = WorkflowService::new(
            stores.workflows.clone(),
            audit,
            pipeline.clone(),
            notifier.clone(),
        )
        .with_deadline(deadline);

        Self {
            workflow_service: Arc::new(workflow_service),
            pipeline,
            notifier,
            stores,
            admin_token: config
                .server
                .admin_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
            deadline,
        }
    }
}

/// Trait for workflow service operations
#[async_trait::async_trait]
pub trait WorkflowServiceTrait: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Workflow>, DomainError>;
    async fn list(&self) -> Result<Vec<Workflow>, DomainError>;
    async fn create(&self, request: CreateWorkflowRequest) -> Result<Workflow, DomainError>;
    async fn update(&self, id: &str, request: UpdateWorkflowRequest) -> Result<Workflow, DomainError>;
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;
    async fn test(&self, id: &str) -> Result<InvocationResult, WorkflowRunError>;
    async fn execute(
        &self,
        id: &str,
        variables: HashMap<String, String>,
    ) -> Result<InvocationResult, WorkflowRunError>;
    async fn logs(
        &self,
        id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<AuditEntry>, DomainError>;
    async fn log_count(&self, id: &str) -> Result<usize, DomainError>;
}

#[async_trait::async_trait]
impl WorkflowServiceTrait for WorkflowService {
    async fn get(&self, id: &str) -> Result<Option<Workflow>, DomainError> {
        WorkflowService::get(self, id).await
    }

    async fn list(&self) -> Result<Vec<Workflow>, DomainError> {
        WorkflowService::list(self).await
    }

    async fn create(&self, request: CreateWorkflowRequest) -> Result<Workflow, DomainError> {
        WorkflowService::create(self, request).await
    }

    async fn update(&self, id: &str, request: UpdateWorkflowRequest) -> Result<Workflow, DomainError> {
        WorkflowService::update(self, id, request).await
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        WorkflowService::delete(self, id).await
    }

    async fn test(&self, id: &str) -> Result<InvocationResult, WorkflowRunError> {
        WorkflowService::test(self, id).await
    }

    async fn execute(
        &self,
        id: &str,
        variables: HashMap<String, String>,
    ) -> Result<InvocationResult, WorkflowRunError> {
        WorkflowService::execute(self, id, variables).await
    }

    async fn logs(
        &self,
        id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        WorkflowService::logs(self, id, limit, offset).await
    }

    async fn log_count(&self, id: &str) -> Result<usize, DomainError> {
        WorkflowService::log_count(self, id).await
    }
}
