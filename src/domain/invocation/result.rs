//! Normalized invocation result

use serde::{Deserialize, Serialize};

/// Shown when the worker body carries none of the display fields
pub const NO_RESPONSE_FALLBACK: &str = "No response received";

/// Body fields checked for display text, in priority order
const RESPONSE_FIELDS: [&str; 4] = ["result", "responseText", "response", "message"];

/// Successful invocation: `{ "success": true, "data": { "response": ... } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub success: bool,
    pub data: InvocationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationData {
    pub response: String,
}

impl InvocationResult {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            success: true,
            data: InvocationData {
                response: response.into(),
            },
        }
    }

    pub fn response(&self) -> &str {
        &self.data.response
    }
}

/// Picks the display text out of a decoded worker body
///
/// Null and empty-string fields count as absent. Non-string values are
/// rendered as compact JSON.
pub fn derive_response_text(body: &serde_json::Value) -> String {
    let Some(object) = body.as_object() else {
        return NO_RESPONSE_FALLBACK.to_string();
    };

    RESPONSE_FIELDS
        .iter()
        .filter_map(|field| object.get(*field))
        .find_map(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) if text.is_empty() => None,
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string())
}
