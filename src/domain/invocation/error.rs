//! Invocation failure taxonomy

use thiserror::Error;

/// A failed invocation; the status is captured where it is known
#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    /// Missing or placeholder credentials; nothing was sent
    #[error("{message}")]
    Precondition { message: String },

    /// Transport-level failure before a response arrived
    #[error("{message}")]
    Network {
        message: String,
        cause: Option<String>,
    },

    /// The response body was not JSON
    #[error("{message}")]
    Decode {
        message: String,
        status: u16,
        cause: String,
    },

    /// The worker answered with a non-2xx status
    #[error("{message}")]
    RemoteRejection {
        message: String,
        status: u16,
        status_text: String,
        body: serde_json::Value,
    },

    /// The caller's deadline elapsed before the worker answered
    #[error("{message}")]
    Timeout { message: String, after_ms: u64 },

    #[error("{message}")]
    Unknown { message: String },
}

impl InvocationError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>, cause: Option<String>) -> Self {
        Self::Network {
            message: message.into(),
            cause,
        }
    }

    pub fn decode(status: u16, cause: impl Into<String>) -> Self {
        let cause = cause.into();

        Self::Decode {
            message: format!("Failed to parse worker response: {}", cause),
            status,
            cause,
        }
    }

    pub fn remote_rejection(
        message: impl Into<String>,
        status: u16,
        status_text: impl Into<String>,
        body: serde_json::Value,
    ) -> Self {
        Self::RemoteRejection {
            message: message.into(),
            status,
            status_text: status_text.into(),
            body,
        }
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        let after_ms = after.as_millis() as u64;
        let window = if after_ms % 1000 == 0 {
            format!("{} seconds", after.as_secs())
        } else {
            format!("{} ms", after_ms)
        };

        Self::Timeout {
            message: format!("The remote worker API did not respond within {}", window),
            after_ms,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Precondition { message }
            | Self::Network { message, .. }
            | Self::Decode { message, .. }
            | Self::RemoteRejection { message, .. }
            | Self::Timeout { message, .. }
            | Self::Unknown { message } => message,
        }
    }

    /// HTTP status of the worker response, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Decode { status, .. } | Self::RemoteRejection { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded response body of a rejection
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            Self::RemoteRejection { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Underlying cause chain, recorded as the audit entry's trace
    pub fn trace(&self) -> Option<&str> {
        match self {
            Self::Network { cause, .. } => cause.as_deref(),
            Self::Decode { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Short variant tag used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Precondition { .. } => "precondition",
            Self::Network { .. } => "network",
            Self::Decode { .. } => "decode",
            Self::RemoteRejection { .. } => "remote_rejection",
            Self::Timeout { .. } => "timeout",
            Self::Unknown { .. } => "unknown",
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message() {
        let err = InvocationError::remote_rejection(
            "Worker quota exhausted",
            429,
            "Too Many Requests",
            serde_json::json!({"message": "Worker quota exhausted"}),
        );

        assert_eq!(err.to_string(), "Worker quota exhausted");
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.details().unwrap()["message"], "Worker quota exhausted");
    }

    #[test]
    fn test_decode_keeps_status_and_cause() {
        let err = InvocationError::decode(502, "expected value at line 1 column 1");

        assert_eq!(err.status(), Some(502));
        assert_eq!(err.trace(), Some("expected value at line 1 column 1"));
        assert!(err.message().starts_with("Failed to parse worker response"));
    }

    #[test]
    fn test_network_has_no_status() {
        let err = InvocationError::network("Connection refused", None);

        assert!(err.status().is_none());
        assert!(err.details().is_none());
        assert!(err.trace().is_none());
        assert!(!err.is_precondition());
        assert_eq!(err.kind(), "network");
    }

    #[test]
    fn test_timeout_message() {
        let err = InvocationError::timeout(std::time::Duration::from_secs(30));

        assert!(err.is_timeout());
        assert_eq!(
            err.message(),
            "The remote worker API did not respond within 30 seconds"
        );
        assert!(err.status().is_none());
    }

    #[test]
    fn test_sub_second_timeout_message_uses_millis() {
        let err = InvocationError::timeout(std::time::Duration::from_millis(50));

        assert_eq!(
            err.message(),
            "The remote worker API did not respond within 50 ms"
        );
        assert!(matches!(err, InvocationError::Timeout { after_ms: 50, .. }));
    }
}
