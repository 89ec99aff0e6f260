//! Workflow domain entity

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::invocation::{
    CallDescriptor, InvocationRequest, PLACEHOLDER_AUTH_TOKEN, PLACEHOLDER_WORKER_ID,
    WORKFLOW_VARIABLE,
};
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Maximum length for workflow IDs
pub const MAX_ID_LENGTH: usize = 50;

/// Maximum length for workflow names
pub const MAX_NAME_LENGTH: usize = 128;

/// Alphanumeric and hyphens, starting and ending alphanumeric
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$").unwrap());

/// Validated workflow identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_workflow_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for WorkflowId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn validate_workflow_id(id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::invalid_id("Workflow ID cannot be empty"));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(DomainError::invalid_id(format!(
            "Workflow ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(DomainError::invalid_id(format!(
            "Invalid workflow ID '{}': must be alphanumeric with hyphens, start and end with alphanumeric",
            id
        )));
    }

    Ok(())
}

/// A stored workflow record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,

    name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    /// Identity sent to the worker endpoint
    worker_id: String,

    /// Bearer token for the worker endpoint
    auth_token: String,

    call: CallDescriptor,

    #[serde(default)]
    variables: HashMap<String, String>,

    /// Configuration version (increments on changes)
    version: u32,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Workflow {
    /// New workflows start with the placeholder credentials a blank form shows
    pub fn new(id: WorkflowId, name: impl Into<String>, call: CallDescriptor) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: None,
            worker_id: PLACEHOLDER_WORKER_ID.to_string(),
            auth_token: PLACEHOLDER_AUTH_TOKEN.to_string(),
            call,
            variables: HashMap::new(),
            version: 1,
            created_at: now,
            updated_at: now,
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
        self.worker_id = worker_id.into();
        self.auth_token = auth_token.into();
        self
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn call(&self) -> &CallDescriptor {
        &self.call
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The auth token with everything but its last four characters hidden
    pub fn masked_auth_token(&self) -> String {
        let chars: Vec<char> = self.auth_token.chars().collect();

        if chars.len() <= 4 {
            return "****".to_string();
        }

        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }

    // Setters (mutate and update timestamp)

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    pub fn set_worker_id(&mut self, worker_id: impl Into<String>) {
        self.worker_id = worker_id.into();
        self.touch();
    }

    pub fn set_auth_token(&mut self, auth_token: impl Into<String>) {
        self.auth_token = auth_token.into();
        self.touch();
    }

    pub fn set_call(&mut self, call: CallDescriptor) {
        self.call = call;
        self.touch();
    }

    pub fn set_variables(&mut self, variables: HashMap<String, String>) {
        self.variables = variables;
        self.touch();
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Checks the record's own fields; credentials may still be placeholders
    pub fn validate(&self) -> Result<(), DomainError> {
        let name = self.name.trim();

        if name.is_empty() {
            return Err(DomainError::validation("Workflow name cannot be empty"));
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Workflow name exceeds maximum length of {} characters",
                MAX_NAME_LENGTH
            )));
        }

        self.call.validate().map_err(DomainError::validation)?;

        Ok(())
    }

    /// Builds the request for one invocation of this workflow
    ///
    /// `extra` overrides stored variables. An execution also carries the
    /// `workflow` variable set to the workflow id.
    pub fn to_invocation_request(
        &self,
        extra: HashMap<String, String>,
        execution: bool,
    ) -> InvocationRequest {
        let mut variables = self.variables.clone();
        variables.extend(extra);

        if execution {
            variables.insert(WORKFLOW_VARIABLE.to_string(), self.id.to_string());
        } else {
            variables.remove(WORKFLOW_VARIABLE);
        }

        InvocationRequest::new(&self.worker_id, &self.auth_token, self.call.clone())
            .with_variables(variables)
            .with_workflow_id(self.id.as_str())
    }
}

impl StorageEntity for Workflow {
    type Key = WorkflowId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
