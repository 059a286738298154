//! Agent status DTOs

use serde::{Deserialize, Serialize};

/// Snapshot of a running agent, served by `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    /// Identity written to `claimed_by`
    pub agent_id: String,
    /// Default printer, if configured
    pub printer_name: Option<String>,
    /// True when the job store could not be reached at startup
    pub degraded: bool,
    /// True when push notifications are flowing
    pub notifier_active: bool,
    /// True while a print is in flight
    pub busy: bool,
    /// Local retry counter of the current target job
    pub retry_attempts: u32,
    /// Persistent user-visible error, if any
    pub last_error: Option<String>,
}
