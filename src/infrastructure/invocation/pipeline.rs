//! Outbound invocation pipeline
//!
//! One call: validate credentials, clear stale success markers, send, decode,
//! derive the display text, audit per [`AuditPolicy`], then return or raise.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::transport::{OutboundRequest, WorkerResponse, WorkerTransport};
use crate::domain::audit::{AuditEntry, AuditLogRepository, FAILURE_PREFIX, SUCCESS_MESSAGE};
use crate::domain::invocation::{
    derive_response_text, AuditAction, AuditPolicy, InvocationError, InvocationOutcome,
    InvocationRequest, InvocationResult,
};

/// A failure plus whether the attempt already wrote its error row
struct Failure {
    error: InvocationError,
    audited: bool,
}

impl From<InvocationError> for Failure {
    fn from(error: InvocationError) -> Self {
        Self {
            error,
            audited: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvocationPipeline {
    transport: Arc<dyn WorkerTransport>,
    audit: Arc<dyn AuditLogRepository>,
}

impl InvocationPipeline {
    pub fn new(transport: Arc<dyn WorkerTransport>, audit: Arc<dyn AuditLogRepository>) -> Self {
        Self { transport, audit }
    }

    /// Performs one invocation
    ///
    /// Precondition failures touch neither the network nor the audit store.
    /// Every other failure is logged and, for workflow executions, audited
    /// before it is returned unchanged.
    pub async fn invoke(
        &self,
        request: &InvocationRequest,
    ) -> Result<InvocationResult, InvocationError> {
        if let Err(e) = request.validate() {
            error!(
                worker_id = %request.worker_id,
                url = %request.call.url,
                method = %request.call.method,
                error = %e,
                "Worker invocation rejected before sending"
            );
            return Err(e);
        }

        match self.attempt(request).await {
            Ok(result) => Ok(result),
            Err(failure) => Err(self.report_failure(request, failure).await),
        }
    }

    /// Runs [`Self::invoke`] under an optional deadline
    ///
    /// An expired deadline drops the attempt and is reported like any other
    /// failure, so a workflow execution still gets its error row.
    pub async fn invoke_within(
        &self,
        request: &InvocationRequest,
        deadline: Option<Duration>,
    ) -> Result<InvocationResult, InvocationError> {
        let Some(deadline) = deadline else {
            return self.invoke(request).await;
        };

        match tokio::time::timeout(deadline, self.invoke(request)).await {
            Ok(result) => result,
            Err(_) => {
                let failure = Failure::from(InvocationError::timeout(deadline));
                Err(self.report_failure(request, failure).await)
            }
        }
    }

    async fn attempt(&self, request: &InvocationRequest) -> Result<InvocationResult, Failure> {
        let workflow_id = request.workflow_id.as_deref();

        if let Some(workflow_id) = workflow_id {
            self.clear_previous_success(workflow_id).await;
        }

        let outbound = OutboundRequest {
            method: request.call.method,
            url: request.call.url.clone(),
            content_type: request.call.content_type.clone(),
            authorization: request.authorization_header(),
            body: request.payload(),
        };

        debug!(
            worker_id = %request.worker_id,
            url = %outbound.url,
            method = %outbound.method,
            "Sending worker invocation"
        );

        let response = self.transport.send(outbound).await?;
        let body = decode(&response)?;
        let response_text = derive_response_text(&body);

        let outcome = if response.is_success() {
            InvocationOutcome::Success
        } else {
            InvocationOutcome::Rejected
        };

        let action = AuditPolicy::decide(
            workflow_id.is_some(),
            request.is_workflow_execution(),
            outcome,
        );

        if let Some(workflow_id) = workflow_id {
            match action {
                AuditAction::InsertInfo => {
                    let entry = AuditEntry::success(
                        workflow_id,
                        serde_json::json!({
                            "status": response.status,
                            "response": response_text,
                        }),
                    );
                    self.record(entry).await;
                }
                AuditAction::InsertError => {
                    let entry = AuditEntry::rejection(
                        workflow_id,
                        response.status,
                        &response.status_text,
                        body.clone(),
                    );
                    self.record(entry).await;
                }
                AuditAction::None => {}
            }
        }

        if !response.is_success() {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}{}", FAILURE_PREFIX, response.status_text));

            return Err(Failure {
                error: InvocationError::remote_rejection(
                    message,
                    response.status,
                    response.status_text,
                    body,
                ),
                audited: action == AuditAction::InsertError,
            });
        }

        info!(
            worker_id = %request.worker_id,
            status = response.status,
            "Worker invocation succeeded"
        );

        Ok(InvocationResult::success(response_text))
    }

    async fn report_failure(&self, request: &InvocationRequest, failure: Failure) -> InvocationError {
        let Failure { error, audited } = failure;

        error!(
            worker_id = %request.worker_id,
            url = %request.call.url,
            method = %request.call.method,
            kind = error.kind(),
            status = ?error.status(),
            error = %error,
            "Worker invocation failed"
        );

        if audited {
            return error;
        }

        let action = AuditPolicy::decide(
            request.workflow_id.is_some(),
            request.is_workflow_execution(),
            InvocationOutcome::Failed,
        );

        if let (AuditAction::InsertError, Some(workflow_id)) = (action, &request.workflow_id) {
            let entry = AuditEntry::failure(workflow_id, error.message(), error.trace());
            self.record(entry).await;
        }

        error
    }

    async fn clear_previous_success(&self, workflow_id: &str) {
        match self.audit.delete_matching(workflow_id, SUCCESS_MESSAGE).await {
            Ok(0) => {}
            Ok(cleared) => debug!(workflow_id, cleared, "Cleared previous success entries"),
            Err(e) => warn!(
                workflow_id,
                error = %e,
                "Failed to clear previous success entries"
            ),
        }
    }

    async fn record(&self, entry: AuditEntry) {
        let workflow_id = entry.workflow_id().to_string();

        if let Err(e) = self.audit.insert(entry).await {
            warn!(workflow_id = %workflow_id, error = %e, "Failed to write audit entry");
        }
    }
}

fn decode(response: &WorkerResponse) -> Result<serde_json::Value, InvocationError> {
    serde_json::from_str(&response.body)
        .map_err(|e| InvocationError::decode(response.status, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::{
        AuditLevel, AuditLogQuery, MockAuditLogRepository, CONNECT_FAILURE_FALLBACK,
    };
    use crate::domain::invocation::{
        CallDescriptor, HttpMethod, PLACEHOLDER_AUTH_TOKEN, PLACEHOLDER_WORKER_ID,
        WORKFLOW_VARIABLE,
    };
    use crate::domain::DomainError;
    use crate::infrastructure::audit::StorageAuditLogRepository;
    use crate::infrastructure::invocation::{MockWorkerTransport, ReqwestWorkerTransport};
    use crate::infrastructure::storage::InMemoryStorage;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        server: MockServer,
        audit: Arc<StorageAuditLogRepository>,
        pipeline: InvocationPipeline,
    }

    impl Harness {
        async fn new() -> Self {
            let server = MockServer::start().await;
            let audit = Arc::new(StorageAuditLogRepository::new(Arc::new(
                InMemoryStorage::new(),
            )));
            let transport = Arc::new(ReqwestWorkerTransport::new("worker-gateway-test").unwrap());
            let pipeline = InvocationPipeline::new(transport, audit.clone());

            Self {
                server,
                audit,
                pipeline,
            }
        }

        async fn respond(&self, template: ResponseTemplate) {
            Mock::given(method("POST"))
                .and(path("/run"))
                .respond_with(template)
                .mount(&self.server)
                .await;
        }

        fn request(&self) -> InvocationRequest {
            InvocationRequest::new(
                "worker-42",
                "abc",
                CallDescriptor::new(HttpMethod::Post, format!("{}/run", self.server.uri())),
            )
        }

        async fn rows(&self, workflow_id: &str) -> Vec<AuditEntry> {
            self.audit
                .list(&AuditLogQuery::for_workflow(workflow_id))
                .await
                .unwrap()
        }
    }

    fn unreachable_request() -> InvocationRequest {
        InvocationRequest::new(
            "worker-42",
            "abc",
            CallDescriptor::new(HttpMethod::Post, "http://127.0.0.1:1/run"),
        )
    }

    #[tokio::test]
    async fn test_placeholder_credentials_touch_nothing() {
        // Neither mock has expectations, so any call panics
        let pipeline = InvocationPipeline::new(
            Arc::new(MockWorkerTransport::new()),
            Arc::new(MockAuditLogRepository::new()),
        );

        let call = CallDescriptor::new(HttpMethod::Post, "https://workers.example.com/run");
        let cases = [
            ("", "abc"),
            (PLACEHOLDER_WORKER_ID, "abc"),
            ("worker-42", ""),
            ("worker-42", PLACEHOLDER_AUTH_TOKEN),
        ];

        for (worker_id, token) in cases {
            let request = InvocationRequest::new(worker_id, token, call.clone())
                .with_workflow_id("w1")
                .with_variable(WORKFLOW_VARIABLE, "w1");

            let err = pipeline.invoke(&request).await.unwrap_err();
            assert!(matches!(err, InvocationError::Precondition { .. }));
        }
    }

    #[tokio::test]
    async fn test_sends_bearer_token_and_payload() {
        let harness = Harness::new().await;

        Mock::given(method("POST"))
            .and(path("/run"))
            .and(header("authorization", "Bearer abc"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "workerId": "worker-42",
                "variables": {"region": "eu"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .expect(1)
            .mount(&harness.server)
            .await;

        let result = harness
            .pipeline
            .invoke(&harness.request().with_variable("region", "eu"))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.response(), "ok");
    }

    #[tokio::test]
    async fn test_existing_bearer_prefix_is_not_doubled() {
        let harness = Harness::new().await;

        Mock::given(method("POST"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&harness.server)
            .await;

        let mut request = harness.request();
        request.auth_token = "Bearer abc".to_string();

        let result = harness.pipeline.invoke(&request).await.unwrap();
        assert_eq!(result.response(), "No response received");
    }

    #[tokio::test]
    async fn test_response_text_field_priority() {
        let harness = Harness::new().await;
        harness
            .respond(ResponseTemplate::new(200).set_body_json(json!({"responseText": "ok2"})))
            .await;

        let result = harness.pipeline.invoke(&harness.request()).await.unwrap();
        assert_eq!(result.response(), "ok2");
    }

    #[tokio::test]
    async fn test_ad_hoc_success_writes_one_info_row() {
        let harness = Harness::new().await;
        harness
            .respond(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .await;

        harness
            .pipeline
            .invoke(&harness.request().with_workflow_id("w1"))
            .await
            .unwrap();

        let rows = harness.rows("w1").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].level(), AuditLevel::Info);
        assert_eq!(rows[0].message(), "API request successful");
    }

    #[tokio::test]
    async fn test_repeated_success_keeps_single_marker() {
        let harness = Harness::new().await;
        harness
            .respond(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .await;

        let request = harness.request().with_workflow_id("w1");
        harness.pipeline.invoke(&request).await.unwrap();
        harness.pipeline.invoke(&request).await.unwrap();

        assert_eq!(harness.rows("w1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_execution_success_writes_nothing() {
        let harness = Harness::new().await;
        harness
            .respond(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .await;

        let request = harness
            .request()
            .with_workflow_id("w1")
            .with_variable(WORKFLOW_VARIABLE, "x");
        harness.pipeline.invoke(&request).await.unwrap();

        assert!(harness.rows("w1").await.is_empty());
    }

    #[tokio::test]
    async fn test_execution_success_clears_previous_marker() {
        let harness = Harness::new().await;
        harness
            .respond(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .await;

        let ad_hoc = harness.request().with_workflow_id("w1");
        harness.pipeline.invoke(&ad_hoc).await.unwrap();

        let execution = ad_hoc.clone().with_variable(WORKFLOW_VARIABLE, "w1");
        harness.pipeline.invoke(&execution).await.unwrap();

        assert!(harness.rows("w1").await.is_empty());
    }

    #[tokio::test]
    async fn test_rejection_writes_one_error_row() {
        let harness = Harness::new().await;
        harness
            .respond(ResponseTemplate::new(404).set_body_json(json!({"error": "no such worker"})))
            .await;

        let err = harness
            .pipeline
            .invoke(&harness.request().with_workflow_id("w1"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), "API request failed: Not Found");
        assert_eq!(err.details().unwrap()["error"], "no such worker");

        let rows = harness.rows("w1").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].level(), AuditLevel::Error);
        assert_eq!(rows[0].message(), "API request failed: Not Found");
        assert_eq!(rows[0].details()["status"], 404);
        assert_eq!(rows[0].details()["response"]["error"], "no such worker");
    }

    #[tokio::test]
    async fn test_execution_rejection_is_not_audited_twice() {
        let harness = Harness::new().await;
        harness
            .respond(
                ResponseTemplate::new(500).set_body_json(json!({"message": "worker crashed"})),
            )
            .await;

        let request = harness
            .request()
            .with_workflow_id("w1")
            .with_variable(WORKFLOW_VARIABLE, "w1");
        let err = harness.pipeline.invoke(&request).await.unwrap_err();

        assert_eq!(err.message(), "worker crashed");
        assert!(matches!(err, InvocationError::RemoteRejection { status: 500, .. }));
        assert_eq!(harness.rows("w1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_without_workflow_id_writes_nothing() {
        let harness = Harness::new().await;
        harness
            .respond(ResponseTemplate::new(401).set_body_json(json!({})))
            .await;

        let err = harness.pipeline.invoke(&harness.request()).await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(harness.rows("").await.is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_audited_only_for_execution() {
        let harness = Harness::new().await;
        harness
            .respond(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .await;

        let ad_hoc = harness.request().with_workflow_id("w1");
        let err = harness.pipeline.invoke(&ad_hoc).await.unwrap_err();
        assert!(matches!(err, InvocationError::Decode { status: 200, .. }));
        assert!(harness.rows("w1").await.is_empty());

        let execution = ad_hoc.with_variable(WORKFLOW_VARIABLE, "w1");
        harness.pipeline.invoke(&execution).await.unwrap_err();

        let rows = harness.rows("w1").await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].message().starts_with("Failed to parse worker response"));
        assert!(rows[0].details()["stack"].is_string());
    }

    #[tokio::test]
    async fn test_network_failure_audited_for_execution() {
        let audit = Arc::new(StorageAuditLogRepository::new(Arc::new(InMemoryStorage::new())));
        let transport = Arc::new(ReqwestWorkerTransport::new("test").unwrap());
        let pipeline = InvocationPipeline::new(transport, audit.clone());

        let request = unreachable_request()
            .with_workflow_id("w1")
            .with_variable(WORKFLOW_VARIABLE, "w1");
        let err = pipeline.invoke(&request).await.unwrap_err();

        assert!(matches!(err, InvocationError::Network { .. }));

        let rows = audit.list(&AuditLogQuery::for_workflow("w1")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].level(), AuditLevel::Error);
        assert_eq!(rows[0].details()["error"], err.message());
    }

    #[tokio::test]
    async fn test_network_failure_with_empty_message_uses_fallback() {
        let mut transport = MockWorkerTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(InvocationError::network("", None)));

        let audit = Arc::new(StorageAuditLogRepository::new(Arc::new(InMemoryStorage::new())));
        let pipeline = InvocationPipeline::new(Arc::new(transport), audit.clone());

        let request = offline_request()
            .with_workflow_id("w1")
            .with_variable(WORKFLOW_VARIABLE, "w1");
        pipeline.invoke(&request).await.unwrap_err();

        let rows = audit.list(&AuditLogQuery::for_workflow("w1")).await.unwrap();
        assert_eq!(rows[0].message(), CONNECT_FAILURE_FALLBACK);
    }

    #[tokio::test]
    async fn test_ad_hoc_network_failure_writes_nothing() {
        let audit = Arc::new(StorageAuditLogRepository::new(Arc::new(InMemoryStorage::new())));
        let transport = Arc::new(ReqwestWorkerTransport::new("test").unwrap());
        let pipeline = InvocationPipeline::new(transport, audit.clone());

        let request = unreachable_request().with_workflow_id("w1");
        pipeline.invoke(&request).await.unwrap_err();

        assert!(audit.list(&AuditLogQuery::for_workflow("w1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failures_do_not_change_outcome() {
        let mut audit = MockAuditLogRepository::new();
        audit
            .expect_delete_matching()
            .times(1)
            .returning(|_, _| Err(DomainError::storage("database is down")));
        audit
            .expect_insert()
            .times(1)
            .returning(|_| Err(DomainError::storage("database is down")));

        let mut transport = MockWorkerTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(WorkerResponse {
                status: 200,
                status_text: "OK".to_string(),
                body: r#"{"message":"queued"}"#.to_string(),
            })
        });

        let pipeline = InvocationPipeline::new(Arc::new(transport), Arc::new(audit));
        let result = pipeline
            .invoke(&offline_request().with_workflow_id("w1"))
            .await
            .unwrap();

        assert_eq!(result.response(), "queued");
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let harness = Harness::new().await;
        harness
            .respond(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .await;

        let err = harness
            .pipeline
            .invoke_within(&harness.request(), Some(Duration::from_millis(50)))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_deadline_exceeded_on_execution_is_audited() {
        let harness = Harness::new().await;
        harness
            .respond(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .await;
        harness
            .audit
            .insert(AuditEntry::success("w1", json!({})))
            .await
            .unwrap();

        let request = harness
            .request()
            .with_workflow_id("w1")
            .with_variable(WORKFLOW_VARIABLE, "w1");
        let err = harness
            .pipeline
            .invoke_within(&request, Some(Duration::from_millis(50)))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(
            err.message(),
            "The remote worker API did not respond within 50 ms"
        );

        let rows = harness.rows("w1").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].level(), AuditLevel::Error);
        assert_eq!(rows[0].message(), err.message());
        assert_eq!(rows[0].details()["error"], err.message());
    }

    #[tokio::test]
    async fn test_deadline_exceeded_on_ad_hoc_test_is_not_audited() {
        let harness = Harness::new().await;
        harness
            .respond(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .await;

        let err = harness
            .pipeline
            .invoke_within(
                &harness.request().with_workflow_id("w1"),
                Some(Duration::from_millis(50)),
            )
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(harness.rows("w1").await.is_empty());
    }

    #[tokio::test]
    async fn test_no_deadline_runs_to_completion() {
        let harness = Harness::new().await;
        harness
            .respond(ResponseTemplate::new(200).set_body_json(json!({"message": "done"})))
            .await;

        let result = harness
            .pipeline
            .invoke_within(&harness.request(), None)
            .await
            .unwrap();

        assert_eq!(result.response(), "done");
    }

    fn offline_request() -> InvocationRequest {
        InvocationRequest::new(
            "worker-42",
            "abc",
            CallDescriptor::new(HttpMethod::Post, "https://workers.example.com/run"),
        )
    }
}
