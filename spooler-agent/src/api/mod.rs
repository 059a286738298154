//! API Module
//!
//! Local control API of the agent.

pub mod error;
pub mod health;
pub mod print;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::scheduler::JobRunner;

/// Create the control API router
pub fn create_router(runner: Arc<JobRunner>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/print", post(print::submit_print))
        .route("/trigger", post(print::trigger))
        .with_state(runner)
        .layer(TraceLayer::new_for_http())
}
