//! Spooler Core
//!
//! Core types shared by the Spooler print agent, its store client and the CLI.
//!
//! This crate contains:
//! - Domain types: print jobs, their lifecycle status and label layout
//! - DTOs: the operator command surface and agent status reports

pub mod domain;
pub mod dto;
