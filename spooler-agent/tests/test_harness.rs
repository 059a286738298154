//! Shared fixtures for agent integration tests.
//!
//! Agents run against one in-memory store and a stub printer that records
//! every submission, so tests can observe the printer and the table without
//! a database or CUPS.

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::Url;
use spooler_agent::repository::{JobRepository, MemoryJobRepository};
use spooler_agent::scheduler::{JobRunner, RetryPolicy};
use spooler_agent::service::{
    ArtifactFetcher, ExecutorSettings, PrintError, PrintExecutor, PrintOptions, Printer,
    SurfaceFactory,
};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Printer that records calls and can be told to fail
pub struct StubPrinter {
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubPrinter {
    pub fn working() -> Arc<Self> {
        Self::build(false, Duration::ZERO)
    }

    pub fn failing() -> Arc<Self> {
        Self::build(true, Duration::ZERO)
    }

    /// Working printer that takes `delay` per submission
    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(false, delay)
    }

    fn build(fail: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fail,
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Printer for StubPrinter {
    async fn print_file(
        &self,
        path: &Path,
        _printer_name: &str,
        _options: &PrintOptions,
    ) -> Result<(), PrintError> {
        assert!(path.exists(), "label file must exist while printing");

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            Err(PrintError::Printer("printer offline".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Label source and scratch directory for one test
pub struct Workspace {
    labels: TempDir,
    scratch: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            labels: TempDir::new().unwrap(),
            scratch: TempDir::new().unwrap(),
        }
    }

    /// `file://` URL of a freshly written label
    pub fn label_url(&self, name: &str) -> String {
        let path = self.labels.path().join(name);
        std::fs::write(&path, b"%PDF-1.4 label").unwrap();
        Url::from_file_path(path).unwrap().to_string()
    }

    pub fn executor(
        &self,
        printer: Arc<StubPrinter>,
        surfaces: Option<Arc<dyn SurfaceFactory>>,
    ) -> Arc<PrintExecutor> {
        self.executor_for(printer, surfaces, Some("Zebra_ZD420"))
    }

    /// Executor whose default printer is `default_printer`
    pub fn executor_for(
        &self,
        printer: Arc<StubPrinter>,
        surfaces: Option<Arc<dyn SurfaceFactory>>,
        default_printer: Option<&str>,
    ) -> Arc<PrintExecutor> {
        let fetcher = ArtifactFetcher::new(Duration::from_secs(5))
            .unwrap()
            .with_temp_dir(self.scratch.path());
        let settings = ExecutorSettings {
            default_printer: default_printer.map(str::to_string),
            render_timeout: Duration::from_millis(100),
            render_settle: Duration::ZERO,
            teardown_delay: Duration::ZERO,
            ..Default::default()
        };
        Arc::new(PrintExecutor::new(fetcher, printer, surfaces, settings))
    }

    /// Temporary label files left behind
    pub fn leftover_files(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }
}

/// Agent over the shared store with a fast retry policy
pub fn agent(
    agent_id: &str,
    repo: &Arc<MemoryJobRepository>,
    workspace: &Workspace,
    printer: Arc<StubPrinter>,
) -> Arc<JobRunner> {
    let jobs: Arc<dyn JobRepository> = repo.clone();
    Arc::new(
        JobRunner::new(agent_id, Some(jobs), workspace.executor(printer, None))
            .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(20))),
    )
}

/// Polls `condition` for up to two seconds
pub async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
