//! Printer delivery
//!
//! Submits a local file to the OS print subsystem. The bundled
//! implementation shells out to a CUPS `lp` compatible program.

use async_trait::async_trait;
use spooler_core::domain::layout::{LabelLayout, Orientation};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use super::error::PrintError;

/// Page options for a single submission
#[derive(Debug, Clone, PartialEq)]
pub struct PrintOptions {
    pub copies: u32,
    /// Exact page setup; overrides `paper_size` and `orientation`
    pub layout: Option<LabelLayout>,
    pub paper_size: Option<String>,
    pub orientation: Option<String>,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            copies: 1,
            layout: None,
            paper_size: None,
            orientation: None,
        }
    }
}

/// Something that can put a file on paper
#[async_trait]
pub trait Printer: Send + Sync {
    async fn print_file(
        &self,
        path: &Path,
        printer_name: &str,
        options: &PrintOptions,
    ) -> Result<(), PrintError>;
}

/// Printer backed by a system print command
#[derive(Debug, Clone)]
pub struct SystemPrinter {
    program: String,
}

impl SystemPrinter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemPrinter {
    fn default() -> Self {
        Self::new("lp")
    }
}

#[async_trait]
impl Printer for SystemPrinter {
    async fn print_file(
        &self,
        path: &Path,
        printer_name: &str,
        options: &PrintOptions,
    ) -> Result<(), PrintError> {
        let args = lp_args(path, printer_name, options);
        debug!("Running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| PrintError::Printer(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrintError::Printer(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        info!("Submitted {} to {}: {}", path.display(), printer_name, stdout.trim());
        Ok(())
    }
}

/// Arguments for an `lp` invocation; the file path comes last
pub fn lp_args(path: &Path, printer_name: &str, options: &PrintOptions) -> Vec<String> {
    let mut args = vec![
        "-d".to_string(),
        printer_name.to_string(),
        "-n".to_string(),
        options.copies.max(1).to_string(),
    ];

    let mut option = |value: String| {
        args.push("-o".to_string());
        args.push(value);
    };

    match &options.layout {
        Some(layout) => {
            option(format!("media={}", layout.media_name()));
            option("fit-to-page".to_string());
            if !layout.color {
                option("print-color-mode=monochrome".to_string());
            }
            option(format!(
                "orientation-requested={}",
                match layout.orientation {
                    Orientation::Portrait => 3,
                    Orientation::Landscape => 4,
                }
            ));
            if layout.borderless {
                for side in ["left", "right", "top", "bottom"] {
                    option(format!("page-{}=0", side));
                }
            }
        }
        None => {
            if let Some(size) = options.paper_size.as_deref().filter(|s| !s.is_empty()) {
                option(format!("media={}", size));
            }
            match options.orientation.as_deref().map(str::to_ascii_lowercase).as_deref() {
                Some("landscape") => option("landscape".to_string()),
                Some("portrait") => option("orientation-requested=3".to_string()),
                _ => {}
            }
        }
    }

    args.push(path.display().to_string());
    args
}
