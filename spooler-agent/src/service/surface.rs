//! Render surfaces for interactive printing
//!
//! A surface displays the label sized to its layout, signals when the
//! document has rendered and then prints what it shows. The bundled surface
//! runs an external renderer program, passing the file path as its last
//! argument and the page size in `SPOOLER_PAGE_WIDTH_MICRONS` and
//! `SPOOLER_PAGE_HEIGHT_MICRONS`. A `pdf-rendered` line on its stdout is the
//! render-complete signal.

use async_trait::async_trait;
use spooler_core::domain::layout::LabelLayout;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, warn};

use super::error::PrintError;
use super::printer::{PrintOptions, Printer};

/// Line a renderer prints once the document is on screen
pub const RENDERED_SIGNAL: &str = "pdf-rendered";

/// An open render surface
#[async_trait]
pub trait RenderSurface: Send {
    /// Resolves once the document has rendered
    async fn wait_rendered(&mut self) -> Result<(), PrintError>;

    /// Prints the rendered document and waits for the result
    async fn print(&mut self, printer_name: &str, options: &PrintOptions) -> Result<(), PrintError>;

    /// Tears the surface down
    async fn close(self: Box<Self>);
}

/// Opens render surfaces
#[async_trait]
pub trait SurfaceFactory: Send + Sync {
    async fn open(
        &self,
        path: &Path,
        layout: &LabelLayout,
    ) -> Result<Box<dyn RenderSurface>, PrintError>;
}

/// Factory for renderer-process surfaces
pub struct ProcessSurfaceFactory {
    program: String,
    args: Vec<String>,
    printer: Arc<dyn Printer>,
}

impl ProcessSurfaceFactory {
    /// Builds a factory from a command line such as `pdf-viewer --kiosk`
    ///
    /// Returns `None` for a blank command line.
    pub fn from_command_line(command: &str, printer: Arc<dyn Printer>) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            printer,
        })
    }
}

#[async_trait]
impl SurfaceFactory for ProcessSurfaceFactory {
    async fn open(
        &self,
        path: &Path,
        layout: &LabelLayout,
    ) -> Result<Box<dyn RenderSurface>, PrintError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .env("SPOOLER_PAGE_WIDTH_MICRONS", layout.width_microns().to_string())
            .env("SPOOLER_PAGE_HEIGHT_MICRONS", layout.height_microns().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PrintError::Render(format!("failed to start {}: {}", self.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PrintError::Render("renderer stdout unavailable".to_string()))?;

        debug!("Opened render surface {} for {}", self.program, path.display());

        Ok(Box::new(ProcessSurface {
            child,
            lines: BufReader::new(stdout).lines(),
            path: path.to_path_buf(),
            layout: layout.clone(),
            printer: Arc::clone(&self.printer),
        }))
    }
}

struct ProcessSurface {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    path: PathBuf,
    layout: LabelLayout,
    printer: Arc<dyn Printer>,
}

#[async_trait]
impl RenderSurface for ProcessSurface {
    async fn wait_rendered(&mut self) -> Result<(), PrintError> {
        while let Some(line) = self.lines.next_line().await? {
            if line.trim() == RENDERED_SIGNAL {
                return Ok(());
            }
        }
        Err(PrintError::Render(
            "renderer exited before signalling completion".to_string(),
        ))
    }

    async fn print(&mut self, printer_name: &str, options: &PrintOptions) -> Result<(), PrintError> {
        let options = PrintOptions {
            layout: Some(self.layout.clone()),
            ..options.clone()
        };
        self.printer
            .print_file(&self.path, printer_name, &options)
            .await
    }

    async fn close(mut self: Box<Self>) {
        if let Err(e) = self.child.kill().await {
            warn!("Failed to stop renderer: {}", e);
        }
    }
}
