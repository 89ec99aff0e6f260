//! Workflow domain module
//!
//! A workflow binds a worker identity, its auth token, one outbound call and
//! a set of variables.

mod entity;

pub use entity::{validate_workflow_id, Workflow, WorkflowId, MAX_ID_LENGTH, MAX_NAME_LENGTH};
