//! Invocation request and call descriptor

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::InvocationError;

/// Form default for the worker id; never a real worker
pub const PLACEHOLDER_WORKER_ID: &str = "your-worker-id";

/// Form default for the auth token; never a real token
pub const PLACEHOLDER_AUTH_TOKEN: &str = "your-auth-token";

/// Variable whose presence marks a workflow execution rather than an ad hoc test
pub const WORKFLOW_VARIABLE: &str = "workflow";

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

const BEARER_PREFIX: &str = "Bearer ";

/// HTTP request method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("Unsupported HTTP method '{}'", other)),
        }
    }
}

/// The one outbound call a workflow knows how to make
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallDescriptor {
    #[serde(default)]
    pub method: HttpMethod,
    pub url: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl CallDescriptor {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            content_type: default_content_type(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Checks the URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("Call URL cannot be empty".to_string());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("Call URL must start with http:// or https://".to_string());
        }

        if self.content_type.trim().is_empty() {
            return Err("Content type cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Everything needed to make one invocation; built fresh per call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    pub worker_id: String,
    pub auth_token: String,
    pub call: CallDescriptor,
    #[serde(default)]
    pub variables: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
}

impl InvocationRequest {
    pub fn new(
        worker_id: impl Into<String>,
        auth_token: impl Into<String>,
        call: CallDescriptor,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            auth_token: auth_token.into(),
            call,
            variables: HashMap::new(),
            workflow_id: None,
        }
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    /// Rejects missing or placeholder credentials
    pub fn validate(&self) -> Result<(), InvocationError> {
        let worker_id = self.worker_id.trim();

        if worker_id.is_empty() || worker_id == PLACEHOLDER_WORKER_ID {
            return Err(InvocationError::precondition(
                "Worker ID is not configured. Please enter your worker ID.",
            ));
        }

        let auth_token = self.auth_token.trim();

        if auth_token.is_empty() || auth_token == PLACEHOLDER_AUTH_TOKEN {
            return Err(InvocationError::precondition(
                "Auth token is not configured. Please enter your auth token.",
            ));
        }

        Ok(())
    }

    /// `Authorization` header value; an existing `Bearer ` prefix is kept
    pub fn authorization_header(&self) -> String {
        if self.auth_token.starts_with(BEARER_PREFIX) {
            self.auth_token.clone()
        } else {
            format!("{}{}", BEARER_PREFIX, self.auth_token)
        }
    }

    /// True when the caller tagged this call as a workflow execution
    pub fn is_workflow_execution(&self) -> bool {
        self.variables.contains_key(WORKFLOW_VARIABLE)
    }

    /// JSON body sent to the worker endpoint
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "workerId": self.worker_id,
            "variables": self.variables,
        })
    }
}
