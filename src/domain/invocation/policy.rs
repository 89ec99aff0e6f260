//! Audit decision table
//!
//! | workflow id | execution | outcome  | action       |
//! |-------------|-----------|----------|--------------|
//! | no          | any       | any      | none         |
//! | yes         | no        | success  | insert info  |
//! | yes         | yes       | success  | none         |
//! | yes         | any       | rejected | insert error |
//! | yes         | yes       | failed   | insert error |
//! | yes         | no        | failed   | none         |
//!
//! "rejected" is a non-2xx response; "failed" is any failure without a
//! decoded rejection (transport, decode, unknown).

/// How an attempt ended, as far as auditing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    Success,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    None,
    InsertInfo,
    InsertError,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditPolicy;

impl AuditPolicy {
    pub fn decide(
        has_workflow_id: bool,
        is_workflow_execution: bool,
        outcome: InvocationOutcome,
    ) -> AuditAction {
        if !has_workflow_id {
            return AuditAction::None;
        }

        match (outcome, is_workflow_execution) {
            (InvocationOutcome::Success, false) => AuditAction::InsertInfo,
            (InvocationOutcome::Success, true) => AuditAction::None,
            (InvocationOutcome::Rejected, _) => AuditAction::InsertError,
            (InvocationOutcome::Failed, true) => AuditAction::InsertError,
            (InvocationOutcome::Failed, false) => AuditAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InvocationOutcome::*;

    #[test]
    fn test_no_workflow_id_never_audits() {
        for outcome in [Success, Rejected, Failed] {
            for execution in [true, false] {
                assert_eq!(AuditPolicy::decide(false, execution, outcome), AuditAction::None);
            }
        }
    }

    #[test]
    fn test_success_rows() {
        assert_eq!(AuditPolicy::decide(true, false, Success), AuditAction::InsertInfo);
        assert_eq!(AuditPolicy::decide(true, true, Success), AuditAction::None);
    }

    #[test]
    fn test_rejections_always_audited() {
        assert_eq!(AuditPolicy::decide(true, false, Rejected), AuditAction::InsertError);
        assert_eq!(AuditPolicy::decide(true, true, Rejected), AuditAction::InsertError);
    }

    #[test]
    fn test_failures_audited_only_for_executions() {
        assert_eq!(AuditPolicy::decide(true, true, Failed), AuditAction::InsertError);
        assert_eq!(AuditPolicy::decide(true, false, Failed), AuditAction::None);
    }
}
