//! Invoke command - one worker call through the audited pipeline

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::invocation::{
    classify, CallDescriptor, HttpMethod, InvocationRequest, DEFAULT_CONTENT_TYPE,
};
use crate::infrastructure::invocation::{InvocationPipeline, ReqwestWorkerTransport};
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::storage::Stores;

#[derive(Args, Debug)]
pub struct InvokeArgs {
    /// Worker identifier sent in the request body
    #[arg(long)]
    pub worker_id: String,

    /// Bearer token for the worker API
    #[arg(long)]
    pub auth_token: String,

    /// Worker endpoint URL
    #[arg(long)]
    pub url: String,

    #[arg(long, default_value = "POST")]
    pub method: HttpMethod,

    #[arg(long, default_value = DEFAULT_CONTENT_TYPE)]
    pub content_type: String,

    /// Variable passed to the worker, as `key=value`; repeatable
    #[arg(long = "var", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Workflow the call is audited under
    #[arg(long)]
    pub workflow_id: Option<String>,

    /// Overrides the configured invocation deadline
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub deadline_secs: Option<u64>,
}

impl InvokeArgs {
    fn to_request(&self) -> InvocationRequest {
        let call = CallDescriptor::new(self.method, self.url.clone())
            .with_content_type(self.content_type.clone());
        let variables: HashMap<String, String> = self.vars.iter().cloned().collect();

        let request = InvocationRequest::new(&self.worker_id, &self.auth_token, call)
            .with_variables(variables);

        match &self.workflow_id {
            Some(id) => request.with_workflow_id(id),
            None => request,
        }
    }

    fn deadline(&self, config: &AppConfig) -> Option<Duration> {
        self.deadline_secs
            .map(Duration::from_secs)
            .or_else(|| config.invocation.deadline())
    }
}

/// Run one invocation and print the normalized result
pub async fn run(args: InvokeArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let stores = Stores::in_memory();
    let transport = Arc::new(ReqwestWorkerTransport::new(&config.invocation.user_agent)?);
    let pipeline = InvocationPipeline::new(transport, stores.audit);

    let request = args.to_request();
    debug!(worker_id = %request.worker_id, url = %request.call.url, "Invoking worker");

    match pipeline.invoke_within(&request, args.deadline(&config)).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            let classification = classify(&e);
            eprintln!("{}", classification.user_message);
            eprintln!("{} ({})", e.message(), classification.error_kind);
            std::process::exit(1);
        }
    }
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("variable name is empty in '{}'", s));
    }

    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: InvokeArgs,
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("region=eu").unwrap(),
            ("region".to_string(), "eu".to_string())
        );
        assert_eq!(
            parse_var("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_var("empty=").unwrap().1, "");
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=value").is_err());
    }

    #[test]
    fn test_method_flag_is_case_insensitive() {
        let cli = TestCli::parse_from([
            "invoke",
            "--worker-id",
            "w",
            "--auth-token",
            "t",
            "--url",
            "http://localhost",
            "--method",
            "get",
        ]);
        assert_eq!(cli.args.method, HttpMethod::Get);

        let unsupported = TestCli::try_parse_from([
            "invoke",
            "--worker-id",
            "w",
            "--auth-token",
            "t",
            "--url",
            "http://localhost",
            "--method",
            "TRACE",
        ]);
        assert!(unsupported.is_err());
    }

    #[test]
    fn test_zero_deadline_flag_is_rejected() {
        let result = TestCli::try_parse_from([
            "invoke",
            "--worker-id",
            "w",
            "--auth-token",
            "t",
            "--url",
            "http://localhost",
            "--deadline-secs",
            "0",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_args_build_request() {
        let cli = TestCli::parse_from([
            "invoke",
            "--worker-id",
            "worker-42",
            "--auth-token",
            "tok_abc",
            "--url",
            "https://workers.example.com/run",
            "--var",
            "region=eu",
            "--var",
            "workflow=nightly-sync",
            "--workflow-id",
            "nightly-sync",
        ]);

        let request = cli.args.to_request();

        assert_eq!(request.call.method, HttpMethod::Post);
        assert_eq!(request.call.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(request.variables.get("region").unwrap(), "eu");
        assert!(request.is_workflow_execution());
        assert_eq!(request.workflow_id.as_deref(), Some("nightly-sync"));
    }

    #[test]
    fn test_deadline_flag_overrides_config() {
        let cli = TestCli::parse_from([
            "invoke",
            "--worker-id",
            "w",
            "--auth-token",
            "t",
            "--url",
            "http://localhost",
            "--deadline-secs",
            "5",
        ]);
        let mut config = AppConfig::default();
        config.invocation.deadline_secs = Some(30);

        assert_eq!(cli.args.deadline(&config), Some(Duration::from_secs(5)));
    }
}
