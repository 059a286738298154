//! Core domain types
//!
//! These types mirror the rows of the shared `print_jobs` table and are
//! shared between the agent (claims and prints) and the CLI (inspects and
//! enqueues).

pub mod job;
pub mod layout;
