//! Operator print commands
//!
//! The synchronous command surface exposed by the agent. A command either
//! names a queued job by id or, with the reserved order id `TEST-PRINT`,
//! describes an ad-hoc document that never touches the queue.

use serde::{Deserialize, Serialize};

/// Order id reserved for ad-hoc documents
pub const TEST_PRINT_ORDER_ID: &str = "TEST-PRINT";

/// Kind tag carried on every command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommandKind {
    #[default]
    #[serde(rename = "PRINT")]
    Print,
}

/// A print request issued by an operator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintCommand {
    #[serde(rename = "type", default)]
    pub kind: CommandKind,
    /// Job id for queue jobs, or `TEST-PRINT`
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PrintSettings>,
}

/// Nested overrides; these win over the top-level fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
}

impl PrintCommand {
    /// Command for a queued job
    pub fn for_job(job_id: impl Into<String>) -> Self {
        Self {
            order_id: job_id.into(),
            ..Default::default()
        }
    }

    /// Command for an ad-hoc document
    pub fn test_print(label_url: impl Into<String>) -> Self {
        Self {
            order_id: TEST_PRINT_ORDER_ID.to_string(),
            label_url: Some(label_url.into()),
            ..Default::default()
        }
    }

    pub fn is_ad_hoc(&self) -> bool {
        self.order_id == TEST_PRINT_ORDER_ID
    }

    /// `settings.labelUrl`, then `labelUrl`; blank values count as absent
    pub fn label_url(&self) -> Option<&str> {
        self.settings
            .as_ref()
            .and_then(|s| non_blank(s.label_url.as_deref()))
            .or_else(|| non_blank(self.label_url.as_deref()))
    }

    /// `settings.printerName`, then `printerName`; blank values count as absent
    pub fn printer_name(&self) -> Option<&str> {
        self.settings
            .as_ref()
            .and_then(|s| non_blank(s.printer_name.as_deref()))
            .or_else(|| non_blank(self.printer_name.as_deref()))
    }

    /// Commands print interactively unless `settings.silent` says otherwise
    pub fn silent(&self) -> bool {
        self.settings
            .as_ref()
            .and_then(|s| s.silent)
            .unwrap_or(false)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Outcome reported back to the command caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PrintResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}
