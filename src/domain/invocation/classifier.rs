//! Operator-facing error classification

use serde::Serialize;

use super::error::InvocationError;

/// Category of a failed invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    Permission,
    NotFound,
    RateLimit,
    ServerError,
    Configuration,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Permission => "permission",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::ServerError => "server_error",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Unknown => "unknown",
        }
    }

    /// Fixed message shown to the operator for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => {
                "Authentication failed. Please check your API credentials."
            }
            ErrorCategory::Permission => {
                "Permission denied. Please check that your credentials can access this worker."
            }
            ErrorCategory::NotFound => {
                "The worker endpoint was not found. Please check the API URL."
            }
            ErrorCategory::RateLimit => "Rate limit exceeded. Please wait a moment and try again.",
            ErrorCategory::ServerError => {
                "The remote worker API encountered a server error. Please try again later."
            }
            ErrorCategory::Configuration => "The workflow is not fully configured.",
            ErrorCategory::Unknown => "An unexpected error occurred. Please try again.",
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCategory::Authentication,
            403 => ErrorCategory::Permission,
            404 => ErrorCategory::NotFound,
            429 => ErrorCategory::RateLimit,
            500..=599 => ErrorCategory::ServerError,
            _ => ErrorCategory::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the notifier shows for a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub user_message: String,
    pub error_kind: ErrorCategory,
}

impl Classification {
    fn of(category: ErrorCategory) -> Self {
        Self {
            user_message: category.user_message().to_string(),
            error_kind: category,
        }
    }
}

/// Classifies on the status captured by the pipeline, never on message text
pub fn classify(error: &InvocationError) -> Classification {
    if let InvocationError::Precondition { message } = error {
        return Classification {
            user_message: message.clone(),
            error_kind: ErrorCategory::Configuration,
        };
    }

    let category = error
        .status()
        .map(ErrorCategory::from_status)
        .unwrap_or(ErrorCategory::Unknown);

    Classification::of(category)
}

/// Classifies a bare error message by the status codes it mentions
///
/// Only for failures that reach us as text with no structured status. A
/// message that merely contains one of these numbers is misclassified.
pub fn classify_message(raw: &str) -> Classification {
    const MARKERS: [(&str, ErrorCategory); 5] = [
        ("401", ErrorCategory::Authentication),
        ("403", ErrorCategory::Permission),
        ("404", ErrorCategory::NotFound),
        ("429", ErrorCategory::RateLimit),
        ("500", ErrorCategory::ServerError),
    ];

    let category = MARKERS
        .iter()
        .find(|(marker, _)| raw.contains(marker))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::Unknown);

    Classification::of(category)
}
