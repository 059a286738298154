//! Operator command tests: ad-hoc test prints and direct job claims.

mod test_harness;

use async_trait::async_trait;
use spooler_agent::repository::{JobRepository, MemoryJobRepository};
use spooler_agent::scheduler::JobRunner;
use spooler_agent::service::{PrintError, PrintOptions, RenderSurface, SurfaceFactory};
use spooler_core::domain::job::JobStatus;
use spooler_core::domain::layout::LabelLayout;
use spooler_core::dto::command::{PrintCommand, PrintResponse, PrintSettings};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use test_harness::{StubPrinter, Workspace, agent};

#[tokio::test]
async fn test_ad_hoc_print_never_touches_the_store() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let printer = StubPrinter::working();
    let runner = agent("agent-a", &repo, &workspace, printer.clone());

    let mut command = PrintCommand::test_print(workspace.label_url("test.pdf"));
    command.settings = Some(PrintSettings {
        silent: Some(true),
        ..Default::default()
    });
    let response = runner.submit(command).await;

    assert_eq!(response, PrintResponse::ok("Test print completed successfully"));
    assert_eq!(printer.calls(), 1);
    assert_eq!(repo.write_count(), 0);
    assert!(repo.jobs().is_empty());
    assert_eq!(workspace.leftover_files(), 0);
}

#[tokio::test]
async fn test_ad_hoc_print_works_without_a_store() {
    let workspace = Workspace::new();
    let printer = StubPrinter::working();
    let runner = Arc::new(JobRunner::new(
        "agent-a",
        None,
        workspace.executor(printer.clone(), None),
    ));

    let mut command = PrintCommand::test_print(workspace.label_url("test.pdf"));
    command.settings = Some(PrintSettings {
        silent: Some(true),
        ..Default::default()
    });

    assert!(runner.submit(command).await.success);
    assert_eq!(printer.calls(), 1);
}

#[tokio::test]
async fn test_command_claims_named_job_out_of_order() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let older = repo.insert_pending("A-1", &workspace.label_url("a.pdf"));
    let newer = repo.insert_pending("A-2", &workspace.label_url("b.pdf"));
    let runner = agent("agent-a", &repo, &workspace, StubPrinter::working());

    let mut command = PrintCommand::for_job(newer.to_string());
    command.settings = Some(PrintSettings {
        silent: Some(true),
        ..Default::default()
    });
    let response = runner.submit(command).await;

    assert_eq!(response, PrintResponse::ok("Print job completed successfully"));
    assert_eq!(repo.get(newer).unwrap().status, JobStatus::Completed);
    assert!(repo.get(older).unwrap().is_claimable());
}

#[tokio::test]
async fn test_command_print_failure_keeps_job_claimed() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let id = repo.insert_pending("A-1", &workspace.label_url("a.pdf"));
    let runner = agent("agent-a", &repo, &workspace, StubPrinter::failing());

    let mut command = PrintCommand::for_job(id.to_string());
    command.settings = Some(PrintSettings {
        silent: Some(true),
        ..Default::default()
    });
    let response = runner.submit(command).await;

    assert!(!response.success);
    assert_eq!(response.message, "Failed to process print job");
    assert!(!runner.retry_pending());

    let job = repo.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Printing);
    assert_eq!(job.claimed_by.as_deref(), Some("agent-a"));
}

#[tokio::test]
async fn test_command_for_claimed_job_is_rejected() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let id = repo.insert_pending("A-1", &workspace.label_url("a.pdf"));
    repo.claim(id, "agent-b").await.unwrap();
    let printer = StubPrinter::working();
    let runner = agent("agent-a", &repo, &workspace, printer.clone());

    let response = runner.submit(PrintCommand::for_job(id.to_string())).await;

    assert_eq!(
        response,
        PrintResponse::failure("Job not available for claiming", "Job not found or already claimed")
    );
    assert_eq!(printer.calls(), 0);
}

struct HangingSurfaces {
    closed: Arc<AtomicBool>,
}

struct HangingSurface {
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl RenderSurface for HangingSurface {
    async fn wait_rendered(&mut self) -> Result<(), PrintError> {
        std::future::pending::<Result<(), PrintError>>().await
    }

    async fn print(&mut self, _: &str, _: &PrintOptions) -> Result<(), PrintError> {
        Ok(())
    }

    async fn close(self: Box<Self>) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SurfaceFactory for HangingSurfaces {
    async fn open(&self, _: &Path, _: &LabelLayout) -> Result<Box<dyn RenderSurface>, PrintError> {
        Ok(Box::new(HangingSurface {
            closed: Arc::clone(&self.closed),
        }))
    }
}

#[tokio::test]
async fn test_interactive_render_timeout_cleans_up() {
    let workspace = Workspace::new();
    let printer = StubPrinter::working();
    let closed = Arc::new(AtomicBool::new(false));
    let surfaces: Arc<dyn SurfaceFactory> = Arc::new(HangingSurfaces {
        closed: Arc::clone(&closed),
    });
    let repo = Arc::new(MemoryJobRepository::new());
    let jobs: Arc<dyn JobRepository> = repo.clone();
    let runner = Arc::new(JobRunner::new(
        "agent-a",
        Some(jobs),
        workspace.executor(printer.clone(), Some(surfaces)),
    ));

    let response = runner
        .submit(PrintCommand::test_print(workspace.label_url("test.pdf")))
        .await;

    assert!(!response.success);
    assert!(response.error.unwrap().contains("Render did not complete"));
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(printer.calls(), 0);
    assert_eq!(workspace.leftover_files(), 0);
    assert!(!runner.is_busy());
}

#[tokio::test]
async fn test_interactive_command_without_renderer_is_refused_before_claim() {
    let workspace = Workspace::new();
    let repo = Arc::new(MemoryJobRepository::new());
    let id = repo.insert_pending("job1", &workspace.label_url("job1.pdf"));
    let printer = StubPrinter::working();
    let runner = agent("agent-a", &repo, &workspace, printer.clone());

    let response = runner.submit(PrintCommand::for_job(id.to_string())).await;

    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some(PrintError::InteractiveUnavailable.to_string().as_str())
    );
    let job = repo.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.claimed_by.is_none());
    assert_eq!(repo.write_count(), 0);
    assert_eq!(printer.calls(), 0);
}
