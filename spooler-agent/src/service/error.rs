//! Print execution errors

use std::time::Duration;
use thiserror::Error;

/// Why a delivery failed
///
/// Caller errors describe a request that can never succeed as issued and
/// are not retried. Everything else is transient. Local errors are caller
/// errors caused by this agent's setup; another agent may still print the
/// same job.
#[derive(Debug, Error)]
pub enum PrintError {
    #[error("Label URL is required")]
    MissingLabelUrl,

    #[error("No printer specified and no default printer configured")]
    MissingPrinter,

    #[error("Invalid label URL: {0}")]
    InvalidUrl(String),

    #[error("Interactive printing requires a renderer command")]
    InteractiveUnavailable,

    #[error("Failed to fetch label: {0}")]
    Fetch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render did not complete within {0:?}")]
    RenderTimeout(Duration),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Printer rejected the job: {0}")]
    Printer(String),
}

impl PrintError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            PrintError::MissingLabelUrl
                | PrintError::MissingPrinter
                | PrintError::InvalidUrl(_)
                | PrintError::InteractiveUnavailable
        )
    }

    /// Whether the failure comes from this agent rather than the job
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PrintError::MissingPrinter | PrintError::InteractiveUnavailable
        )
    }
}

impl From<reqwest::Error> for PrintError {
    fn from(error: reqwest::Error) -> Self {
        PrintError::Fetch(error.to_string())
    }
}
