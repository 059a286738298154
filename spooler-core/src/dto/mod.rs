//! Data Transfer Objects
//!
//! Payloads exchanged between the agent control API and its callers, and
//! between the CLI and the job store.

pub mod agent;
pub mod command;
pub mod job;
