//! Spooler Agent
//!
//! A background print agent. Several agents watch one shared `print_jobs`
//! table; each pending job is claimed by exactly one of them through an
//! atomic conditional update, printed on that agent's printer and then
//! marked completed.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Identity: Durable agent id written to `claimed_by`
//! - Repositories: Job store backends (Postgres, REST, in-memory)
//! - Notifier: Push hints that a pending job may exist
//! - Services: Label fetching and printer delivery
//! - Scheduler: Execution guard, claim/execute/reconcile and retries
//! - API: Local control endpoints

pub mod api;
pub mod config;
pub mod db;
pub mod identity;
pub mod notifier;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod shutdown;
