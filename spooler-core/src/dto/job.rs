//! Job DTOs for the store API

use serde::{Deserialize, Serialize};

/// Request to enqueue a new print job
///
/// Only the caller-supplied columns; ids, status and timestamps are filled
/// in by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJob {
    pub order_id: String,
    pub label_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
}
