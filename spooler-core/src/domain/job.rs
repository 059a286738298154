//! Print job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A row of the shared print queue
///
/// Structure shared between the store backends (persist) and the agent
/// (claims and prints). Field names follow the table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// External correlation key, unrelated to `id`
    pub order_id: String,
    /// Location of the printable document
    pub label_url: String,
    pub status: JobStatus,
    /// Identity of the agent that won the claim
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub printed_at: Option<DateTime<Utc>>,
    /// Informational only; agents never write it back
    #[serde(default)]
    pub retries: i32,
    pub last_tried_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub printer_name: Option<String>,
    #[serde(default)]
    pub copies: Option<i32>,
    #[serde(default)]
    pub paper_size: Option<String>,
    #[serde(default)]
    pub orientation: Option<String>,
}

impl Job {
    /// Creates a fresh pending job as it looks right after insertion
    pub fn pending(order_id: impl Into<String>, label_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id: order_id.into(),
            label_url: label_url.into(),
            status: JobStatus::Pending,
            claimed_by: None,
            claimed_at: None,
            printed_at: None,
            retries: 0,
            last_tried_at: None,
            created_at: now,
            updated_at: now,
            printer_name: None,
            copies: None,
            paper_size: None,
            orientation: None,
        }
    }

    /// Whether the job can still be claimed by any agent
    pub fn is_claimable(&self) -> bool {
        self.status == JobStatus::Pending && self.claimed_by.is_none()
    }

    /// Per-job print overrides carried on the row
    pub fn overrides(&self) -> PrintOverrides {
        PrintOverrides {
            printer_name: self.printer_name.clone().filter(|p| !p.is_empty()),
            copies: self.copies.and_then(|c| u32::try_from(c).ok()).filter(|c| *c > 0),
            paper_size: self.paper_size.clone(),
            orientation: self.orientation.clone(),
        }
    }
}

/// Lifecycle state of a print job
///
/// The wire and column representation is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Printing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Printing => "printing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "printing" => Ok(JobStatus::Printing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// Optional per-job print settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrintOverrides {
    pub printer_name: Option<String>,
    pub copies: Option<u32>,
    pub paper_size: Option<String>,
    pub orientation: Option<String>,
}
