//! HTTP transport to the remote worker endpoint

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};

use crate::domain::invocation::{HttpMethod, InvocationError};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// A fully built outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub content_type: String,
    pub authorization: String,
    pub body: serde_json::Value,
}

/// Raw worker response; the body is decoded by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl WorkerResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request; only transport failures are errors
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkerTransport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: OutboundRequest) -> Result<WorkerResponse, InvocationError>;
}

/// Worker transport using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestWorkerTransport {
    client: Client,
}

impl ReqwestWorkerTransport {
    pub fn new(user_agent: &str) -> Result<Self, DomainError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// Renders an error's source chain, outermost first
fn source_chain(error: &dyn std::error::Error) -> Option<String> {
    let mut causes = Vec::new();
    let mut source = error.source();

    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }

    if causes.is_empty() {
        None
    } else {
        Some(causes.join(": "))
    }
}

#[async_trait]
impl WorkerTransport for ReqwestWorkerTransport {
    async fn send(&self, request: OutboundRequest) -> Result<WorkerResponse, InvocationError> {
        let body = serde_json::to_vec(&request.body)
            .map_err(|e| InvocationError::unknown(format!("Failed to encode request body: {}", e)))?;

        let response = self
            .client
            .request(Self::method(request.method), &request.url)
            .header(CONTENT_TYPE, &request.content_type)
            .header(AUTHORIZATION, &request.authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| InvocationError::network(e.to_string(), source_chain(&e)))?;

        let status = response.status();
        let status_text = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_u16().to_string());

        let body = response
            .text()
            .await
            .map_err(|e| InvocationError::network(e.to_string(), source_chain(&e)))?;

        Ok(WorkerResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}
