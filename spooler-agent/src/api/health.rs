//! Health Check API Handler

use axum::{Json, extract::State};
use spooler_core::dto::agent::AgentStatus;
use std::sync::Arc;

use crate::scheduler::JobRunner;

/// GET /health
/// Agent identity, store and print state
pub async fn health_check(State(runner): State<Arc<JobRunner>>) -> Json<AgentStatus> {
    Json(runner.status())
}
