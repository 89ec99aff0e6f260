//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::invocation::{classify, InvocationError};
use crate::domain::DomainError;
use crate::infrastructure::services::WorkflowRunError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    AuthenticationError,
    NotFoundError,
    ServerError,
    UpstreamError,
    TimeoutError,
    ServiceUnavailableError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::TimeoutError => write!(f, "timeout_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Raw failure text behind a classified message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    param: None,
                    code: None,
                    detail: None,
                },
            },
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.response.error.param = Some(param.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.response.error.detail = Some(detail.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiErrorType::AuthenticationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    /// The remote worker failed or could not be reached
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, ApiErrorType::UpstreamError, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, ApiErrorType::TimeoutError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::InvalidId { message } => Self::bad_request(message).with_param("id"),
            DomainError::Configuration { message } => Self::internal(message),
            DomainError::Conflict { message } => Self::bad_request(message).with_code("conflict"),
            DomainError::Internal { message } => Self::internal(message),
            DomainError::Storage { message } => Self::unavailable(message),
        }
    }
}

impl From<InvocationError> for ApiError {
    fn from(err: InvocationError) -> Self {
        let classification = classify(&err);
        let code = classification.error_kind.as_str();

        let api_error = if err.is_precondition() {
            Self::bad_request(classification.user_message)
        } else if err.is_timeout() {
            Self::gateway_timeout(err.message())
        } else {
            Self::bad_gateway(classification.user_message)
        };

        api_error.with_code(code).with_detail(err.message())
    }
}

impl From<WorkflowRunError> for ApiError {
    fn from(err: WorkflowRunError) -> Self {
        match err {
            WorkflowRunError::Domain(e) => e.into(),
            WorkflowRunError::Invocation(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_with_param() {
        let err = ApiError::bad_request("Invalid value")
            .with_param("url")
            .with_code("invalid_type");

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.param, Some("url".to_string()));
        assert_eq!(err.response.error.code, Some("invalid_type".to_string()));
    }

    #[test]
    fn test_domain_error_conversion() {
        let api_err: ApiError = DomainError::not_found("Workflow 'w1' not found").into();
        assert_eq!(api_err.status, StatusCode::NOT_FOUND);
        assert_eq!(api_err.response.error.error_type, ApiErrorType::NotFoundError);

        let api_err: ApiError = DomainError::invalid_id("bad").into();
        assert_eq!(api_err.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_err.response.error.param.as_deref(), Some("id"));
    }

    #[test]
    fn test_precondition_is_bad_request() {
        let api_err: ApiError =
            InvocationError::precondition("Auth token is not configured.").into();

        assert_eq!(api_err.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_err.response.error.code.as_deref(), Some("configuration"));
        assert_eq!(api_err.response.error.message, "Auth token is not configured.");
    }

    #[test]
    fn test_rejection_is_bad_gateway_with_kind() {
        let api_err: ApiError =
            InvocationError::remote_rejection("nope", 403, "Forbidden", json!({})).into();

        assert_eq!(api_err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api_err.response.error.error_type, ApiErrorType::UpstreamError);
        assert_eq!(api_err.response.error.code.as_deref(), Some("permission"));
        assert_eq!(api_err.response.error.detail.as_deref(), Some("nope"));
    }

    #[test]
    fn test_network_failure_is_bad_gateway() {
        let api_err: ApiError = InvocationError::network("Connection refused", None).into();

        assert_eq!(api_err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api_err.response.error.code.as_deref(), Some("unknown"));
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        let api_err: ApiError =
            InvocationError::timeout(std::time::Duration::from_secs(5)).into();

        assert_eq!(api_err.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(api_err.response.error.error_type, ApiErrorType::TimeoutError);
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::unauthorized("Invalid admin token");
        let json = serde_json::to_value(&err.response).unwrap();

        assert_eq!(json["error"]["type"], "authentication_error");
        assert_eq!(json["error"]["message"], "Invalid admin token");
        assert!(json["error"].get("code").is_none());
    }
}
