//! Scheduler layer for the agent
//!
//! This layer decides when a job is considered and drives it from claim
//! to reconciliation. It owns the execution guard and the retry timer.

mod command;
mod guard;
mod poll;
mod retry;
mod runner;

pub use guard::ExecutionGuard;
pub use poll::spawn_poll_loop;
pub use retry::RetryPolicy;
pub use runner::{JobRunner, RunOutcome};
