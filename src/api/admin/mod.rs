//! Admin API endpoints for workflows and ad hoc invocations

pub mod invoke;
pub mod workflows;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route(
            "/workflows/{workflow_id}",
            get(workflows::get_workflow)
                .put(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route("/workflows/{workflow_id}/test", post(workflows::test_workflow))
        .route(
            "/workflows/{workflow_id}/execute",
            post(workflows::execute_workflow),
        )
        .route(
            "/workflows/{workflow_id}/logs",
            get(workflows::list_workflow_logs),
        )
        .route("/invoke", post(invoke::invoke))
}
