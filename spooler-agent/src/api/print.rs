//! Print API Handlers
//!
//! Operator commands and manual triggers.

use axum::{Json, extract::State, http::StatusCode};
use spooler_core::dto::command::{PrintCommand, PrintResponse};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::scheduler::JobRunner;

/// POST /print
/// Runs a print command and waits for its outcome
pub async fn submit_print(
    State(runner): State<Arc<JobRunner>>,
    Json(command): Json<PrintCommand>,
) -> ApiResult<Json<PrintResponse>> {
    if command.order_id.trim().is_empty() {
        return Err(ApiError::BadRequest("orderId is required".to_string()));
    }

    tracing::info!("Print command for {}", command.order_id);
    Ok(Json(runner.submit(command).await))
}

/// POST /trigger
/// Asks the runner to consider the next pending job
pub async fn trigger(State(runner): State<Arc<JobRunner>>) -> ApiResult<StatusCode> {
    if runner.status().degraded {
        return Err(ApiError::ServiceUnavailable(
            "Database connection not available".to_string(),
        ));
    }

    tracing::debug!("Manual trigger");
    runner.trigger();
    Ok(StatusCode::ACCEPTED)
}
