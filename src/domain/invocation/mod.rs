//! Invocation domain module
//!
//! Types for one outbound call to a remote worker: the request and its call
//! descriptor, the normalized result, the failure taxonomy, the operator-facing
//! error classifier, the audit decision table and the notifier capability.

mod classifier;
mod error;
mod notifier;
mod policy;
mod request;
mod result;

pub use classifier::{classify, classify_message, Classification, ErrorCategory};
pub use error::InvocationError;
pub use notifier::{Notification, NotificationKind, Notifier};
pub use policy::{AuditAction, AuditPolicy, InvocationOutcome};
pub use request::{
    CallDescriptor, HttpMethod, InvocationRequest, DEFAULT_CONTENT_TYPE,
    PLACEHOLDER_AUTH_TOKEN, PLACEHOLDER_WORKER_ID, WORKFLOW_VARIABLE,
};
pub use result::{derive_response_text, InvocationData, InvocationResult, NO_RESPONSE_FALLBACK};
