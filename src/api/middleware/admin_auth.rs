//! Admin authentication middleware

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Extractor guarding the admin routes
///
/// When `server.admin_token` is configured the request must present it via
/// `Authorization: Bearer <token>` or the `X-Admin-Token` header.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Ok(RequireAdmin);
        };

        let presented = extract_admin_token(&parts.headers)?;

        if presented != expected {
            debug!("Rejected admin request with invalid token");
            return Err(ApiError::unauthorized("Invalid admin token"));
        }

        Ok(RequireAdmin)
    }
}

fn extract_admin_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(token_header) = headers.get(ADMIN_TOKEN_HEADER) {
        let token = token_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-Admin-Token header encoding"))?;

        return Ok(token.trim().to_string());
    }

    Err(ApiError::unauthorized(
        "Admin token required. Provide via 'Authorization: Bearer <token>' or 'X-Admin-Token: <token>' header",
    ))
}
