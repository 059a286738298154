//! Service layer
//!
//! Services contain the print delivery logic of the agent: fetching the
//! label, submitting it to a printer and cleaning up after it.
//!
//! All services are trait-based to enable testing and dependency injection.

mod error;
mod execution;
mod fetch;
mod printer;
mod surface;

// Re-export traits
pub use execution::ExecutionService;
pub use printer::Printer;
pub use surface::{RenderSurface, SurfaceFactory};

// Re-export implementations
pub use error::PrintError;
pub use execution::{DeliveryRequest, ExecutorSettings, PrintExecutor};
pub use fetch::ArtifactFetcher;
pub use printer::{PrintOptions, SystemPrinter, lp_args};
pub use surface::{ProcessSurfaceFactory, RENDERED_SIGNAL};
