//! Ad hoc invocation endpoint

use axum::extract::State;
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::audit::SUCCESS_MESSAGE;
use crate::domain::invocation::{classify, InvocationRequest, InvocationResult, Notification};

/// POST /admin/invoke
///
/// Runs one invocation from an inline request under the configured deadline.
pub async fn invoke(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<InvocationRequest>,
) -> Result<Json<InvocationResult>, ApiError> {
    debug!(
        worker_id = %request.worker_id,
        url = %request.call.url,
        workflow_id = ?request.workflow_id,
        "Admin ad hoc invocation"
    );

    match state.pipeline.invoke_within(&request, state.deadline).await {
        Ok(result) => {
            state.notifier.notify(Notification::success(SUCCESS_MESSAGE));
            Ok(Json(result))
        }
        Err(e) => {
            state
                .notifier
                .notify(Notification::failure(classify(&e).user_message));
            Err(e.into())
        }
    }
}
