//! Execution service
//!
//! Delivers one label to a printer:
//! - Resolving the label URL and printer name
//! - Fetching the label into a temporary file
//! - Printing silently, or through a render surface sized to the label
//! - Removing the temporary file on every exit path
//!
//! Deliveries are never retried here; the runner decides what a failure
//! means for the job.

use async_trait::async_trait;
use spooler_core::domain::job::PrintOverrides;
use spooler_core::domain::layout::LabelLayout;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::PrintError;
use super::fetch::{ArtifactFetcher, parse_label_url};
use super::printer::{PrintOptions, Printer};
use super::surface::{RenderSurface, SurfaceFactory};

/// What to print and where
#[derive(Debug, Clone, Default)]
pub struct DeliveryRequest {
    pub label_url: Option<String>,
    /// Explicit printer; wins over the override and the default
    pub printer_name: Option<String>,
    /// Submit straight to the print subsystem instead of rendering first
    pub silent: bool,
    pub overrides: PrintOverrides,
}

impl DeliveryRequest {
    /// Silent delivery of a queued job's label with its overrides
    pub fn silent(label_url: impl Into<String>, overrides: PrintOverrides) -> Self {
        Self {
            label_url: Some(label_url.into()),
            printer_name: None,
            silent: true,
            overrides,
        }
    }
}

/// Service trait for delivering labels
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Checks that `request` could be delivered, without fetching or printing
    ///
    /// Callers run it before claiming a job so that a request this agent
    /// cannot serve leaves the job untouched.
    fn check(&self, _request: &DeliveryRequest) -> Result<(), PrintError> {
        Ok(())
    }

    async fn deliver(&self, request: &DeliveryRequest) -> Result<(), PrintError>;
}

/// Timing and defaults for `PrintExecutor`
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Printer used when the request names none
    pub default_printer: Option<String>,
    /// Bound on the render-complete wait
    pub render_timeout: Duration,
    /// Pause between the render signal and the print submission
    pub render_settle: Duration,
    /// Pause between print completion and surface teardown
    pub teardown_delay: Duration,
    pub layout: LabelLayout,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            default_printer: None,
            render_timeout: Duration::from_secs(30),
            render_settle: Duration::from_secs(1),
            teardown_delay: Duration::from_millis(500),
            layout: LabelLayout::shipping_label(),
        }
    }
}

/// Standard implementation of ExecutionService
pub struct PrintExecutor {
    fetcher: ArtifactFetcher,
    printer: Arc<dyn Printer>,
    surfaces: Option<Arc<dyn SurfaceFactory>>,
    settings: ExecutorSettings,
}

impl PrintExecutor {
    pub fn new(
        fetcher: ArtifactFetcher,
        printer: Arc<dyn Printer>,
        surfaces: Option<Arc<dyn SurfaceFactory>>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            fetcher,
            printer,
            surfaces,
            settings,
        }
    }

    fn resolve_printer(&self, request: &DeliveryRequest) -> Result<String, PrintError> {
        non_blank(request.printer_name.as_deref())
            .or_else(|| non_blank(request.overrides.printer_name.as_deref()))
            .or_else(|| non_blank(self.settings.default_printer.as_deref()))
            .map(str::to_string)
            .ok_or(PrintError::MissingPrinter)
    }

    async fn print_interactive(
        &self,
        surfaces: &dyn SurfaceFactory,
        path: &Path,
        printer_name: &str,
        options: &PrintOptions,
    ) -> Result<(), PrintError> {
        let mut surface = surfaces.open(path, &self.settings.layout).await?;
        let result = self
            .render_and_print(surface.as_mut(), printer_name, options)
            .await;

        tokio::time::sleep(self.settings.teardown_delay).await;
        surface.close().await;
        result
    }

    async fn render_and_print(
        &self,
        surface: &mut dyn RenderSurface,
        printer_name: &str,
        options: &PrintOptions,
    ) -> Result<(), PrintError> {
        let timeout = self.settings.render_timeout;
        tokio::time::timeout(timeout, surface.wait_rendered())
            .await
            .map_err(|_| PrintError::RenderTimeout(timeout))??;

        debug!("Label rendered");
        tokio::time::sleep(self.settings.render_settle).await;
        surface.print(printer_name, options).await
    }
}

#[async_trait]
impl ExecutionService for PrintExecutor {
    fn check(&self, request: &DeliveryRequest) -> Result<(), PrintError> {
        self.resolve_printer(request)?;
        if !request.silent && self.surfaces.is_none() {
            return Err(PrintError::InteractiveUnavailable);
        }

        let label_url =
            non_blank(request.label_url.as_deref()).ok_or(PrintError::MissingLabelUrl)?;
        parse_label_url(label_url)?;
        Ok(())
    }

    async fn deliver(&self, request: &DeliveryRequest) -> Result<(), PrintError> {
        self.check(request)?;

        let label_url =
            non_blank(request.label_url.as_deref()).ok_or(PrintError::MissingLabelUrl)?;
        let printer_name = self.resolve_printer(request)?;
        let surfaces = if request.silent {
            None
        } else {
            self.surfaces.clone()
        };

        let options = PrintOptions {
            copies: request.overrides.copies.unwrap_or(1),
            layout: None,
            paper_size: request.overrides.paper_size.clone(),
            orientation: request.overrides.orientation.clone(),
        };

        let artifact = self.fetcher.fetch(label_url).await?;

        let result = match surfaces {
            Some(surfaces) => {
                self.print_interactive(surfaces.as_ref(), artifact.path(), &printer_name, &options)
                    .await
            }
            None => {
                self.printer
                    .print_file(artifact.path(), &printer_name, &options)
                    .await
            }
        };

        let path = artifact.path().to_path_buf();
        if let Err(e) = artifact.close() {
            warn!("Failed to remove temporary file {}: {}", path.display(), e);
        }

        if result.is_ok() {
            info!("Printed {} on {}", label_url, printer_name);
        }
        result
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
