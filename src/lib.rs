//! Worker Gateway
//!
//! Stores workflow records and invokes remote worker endpoints on their
//! behalf, with:
//! - credential preconditions and normalized results
//! - an audit log per workflow
//! - classification of failures into user-facing messages

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::invocation::ReqwestWorkerTransport;
use infrastructure::notifier::TracingNotifier;
use infrastructure::storage::StorageFactory;
use tracing::info;

/// Builds the application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let stores = StorageFactory::build(&config.storage).await?;
    info!(backend = %config.storage.backend, "Storage initialized");

    let transport = Arc::new(ReqwestWorkerTransport::new(&config.invocation.user_agent)?);
    let notifier = Arc::new(TracingNotifier);

    Ok(AppState::new(stores, transport, notifier, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_app_state_in_memory() {
        let state = create_app_state(&AppConfig::default()).await.unwrap();

        assert!(state.admin_token.is_none());
        assert!(state.workflow_service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_app_state_rejects_unknown_backend() {
        let mut config = AppConfig::default();
        config.storage.backend = "redis".to_string();

        assert!(create_app_state(&config).await.is_err());
    }
}
