//! Operator print commands
//!
//! Synchronous path next to the queue runner. A command names a job by id
//! and claims it directly, or carries an ad-hoc document (`TEST-PRINT`) that
//! is printed without touching the store. Commands share the execution
//! guard with the runner and are never retried.
//!
//! A command only claims a job once the agent can serve it. Failures are
//! reported to the caller; the job status is not rewritten.

use spooler_core::dto::command::{PrintCommand, PrintResponse};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::runner::JobRunner;
use crate::service::DeliveryRequest;

const FAILED: &str = "Failed to process print job";
const COMPLETED: &str = "Print job completed successfully";

impl JobRunner {
    /// Executes an operator command and reports the outcome
    pub async fn submit(self: &Arc<Self>, command: PrintCommand) -> PrintResponse {
        if command.is_ad_hoc() {
            return self.submit_ad_hoc(&command).await;
        }

        let Some(jobs) = self.jobs.clone() else {
            return PrintResponse::failure(
                "Job store not initialized",
                "Database connection not available",
            );
        };

        let Ok(job_id) = command.order_id.trim().parse::<Uuid>() else {
            return not_available();
        };

        let Some(_permit) = self.guard.try_enter() else {
            return busy();
        };

        let stored = match jobs.find(job_id).await {
            Ok(Some(job)) if job.is_claimable() => job,
            Ok(_) => return not_available(),
            Err(e) => {
                warn!("Failed to read job {} for command: {}", job_id, e);
                return PrintResponse::failure(FAILED, e.to_string());
            }
        };

        let request = DeliveryRequest {
            label_url: command
                .label_url()
                .map(str::to_string)
                .or_else(|| Some(stored.label_url.clone())),
            printer_name: command.printer_name().map(str::to_string),
            silent: command.silent(),
            overrides: stored.overrides(),
        };

        if let Err(e) = self.executor.check(&request) {
            warn!("Refusing command for job {}: {}", job_id, e);
            return PrintResponse::failure(FAILED, e.to_string());
        }

        let job = match jobs.claim(job_id, self.agent_id()).await {
            Ok(Some(job)) => job,
            Ok(None) => return not_available(),
            Err(e) => {
                warn!("Failed to claim job {} for command: {}", job_id, e);
                return PrintResponse::failure(FAILED, e.to_string());
            }
        };

        info!("Claimed job {} by command", job.id);

        match self.executor.deliver(&request).await {
            Ok(()) => match jobs.mark_completed(job.id).await {
                Ok(()) => {
                    info!("Job {} completed by command", job.id);
                    PrintResponse::ok(COMPLETED)
                }
                Err(e) => {
                    error!("Job {} printed but could not be marked completed: {}", job.id, e);
                    PrintResponse {
                        error: Some(format!(
                            "Printed, but the job could not be marked completed: {}",
                            e
                        )),
                        ..PrintResponse::ok(COMPLETED)
                    }
                }
            },
            Err(e) => {
                warn!("Command print of job {} failed: {}", job.id, e);
                PrintResponse::failure(FAILED, e.to_string())
            }
        }
    }

    async fn submit_ad_hoc(&self, command: &PrintCommand) -> PrintResponse {
        let Some(label_url) = command.label_url() else {
            return PrintResponse::failure(FAILED, "Label URL is required for test print");
        };

        let Some(_permit) = self.guard.try_enter() else {
            return busy();
        };

        let request = DeliveryRequest {
            label_url: Some(label_url.to_string()),
            printer_name: command.printer_name().map(str::to_string),
            silent: command.silent(),
            overrides: Default::default(),
        };

        if let Err(e) = self.executor.check(&request) {
            warn!("Refusing test print of {}: {}", label_url, e);
            return PrintResponse::failure(FAILED, e.to_string());
        }

        match self.executor.deliver(&request).await {
            Ok(()) => {
                info!("Test print of {} completed", label_url);
                PrintResponse::ok("Test print completed successfully")
            }
            Err(e) => {
                warn!("Test print of {} failed: {}", label_url, e);
                PrintResponse::failure(FAILED, e.to_string())
            }
        }
    }
}

fn not_available() -> PrintResponse {
    PrintResponse::failure(
        "Job not available for claiming",
        "Job not found or already claimed",
    )
}

fn busy() -> PrintResponse {
    PrintResponse::failure(
        "Print already in progress",
        "Another print job is currently executing",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{
        JobRepository, MemoryJobRepository, RepositoryError, RepositoryResult,
    };
    use crate::service::{ExecutionService, PrintError};
    use async_trait::async_trait;
    use spooler_core::domain::job::{Job, JobStatus};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingExecutor {
        requests: Mutex<Vec<DeliveryRequest>>,
    }

    #[async_trait]
    impl ExecutionService for RecordingExecutor {
        async fn deliver(&self, request: &DeliveryRequest) -> Result<(), PrintError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn runner(
        repo: Option<Arc<MemoryJobRepository>>,
        executor: Arc<RecordingExecutor>,
    ) -> Arc<JobRunner> {
        let jobs = repo.map(|r| r as Arc<dyn JobRepository>);
        Arc::new(JobRunner::new("agent-a", jobs, executor))
    }

    #[tokio::test]
    async fn test_command_resolution_prefers_settings() {
        let repo = Arc::new(MemoryJobRepository::new());
        let id = repo.insert_pending("A-1", "https://example.com/stored.pdf");
        let executor = Arc::new(RecordingExecutor::default());
        let runner = runner(Some(repo.clone()), executor.clone());

        let command: PrintCommand = serde_json::from_value(serde_json::json!({
            "type": "PRINT",
            "orderId": id.to_string(),
            "printerName": "Office",
            "settings": { "printerName": "Zebra", "silent": true }
        }))
        .unwrap();

        let response = runner.submit(command).await;
        assert_eq!(response, PrintResponse::ok(COMPLETED));

        let requests = executor.requests.lock().unwrap();
        assert_eq!(
            requests[0].label_url.as_deref(),
            Some("https://example.com/stored.pdf")
        );
        assert_eq!(requests[0].printer_name.as_deref(), Some("Zebra"));
        assert!(requests[0].silent);

        let job = repo.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.claimed_by.as_deref(), Some("agent-a"));
    }

    #[tokio::test]
    async fn test_claimed_or_unknown_job_is_not_available() {
        let repo = Arc::new(MemoryJobRepository::new());
        let id = repo.insert_pending("A-1", "https://example.com/a.pdf");
        repo.claim(id, "agent-b").await.unwrap();
        let runner = runner(Some(repo), Arc::new(RecordingExecutor::default()));

        let response = runner.submit(PrintCommand::for_job(id.to_string())).await;
        assert_eq!(response, not_available());

        let response = runner.submit(PrintCommand::for_job("order-42")).await;
        assert_eq!(response, not_available());
    }

    #[tokio::test]
    async fn test_ad_hoc_without_url_fails() {
        let runner = runner(None, Arc::new(RecordingExecutor::default()));

        let mut command = PrintCommand::test_print("");
        command.label_url = None;
        let response = runner.submit(command).await;

        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("Label URL is required for test print")
        );
    }

    #[tokio::test]
    async fn test_queue_command_without_store() {
        let runner = runner(None, Arc::new(RecordingExecutor::default()));

        let response = runner
            .submit(PrintCommand::for_job(Uuid::new_v4().to_string()))
            .await;
        assert_eq!(
            response,
            PrintResponse::failure("Job store not initialized", "Database connection not available")
        );
    }

    #[tokio::test]
    async fn test_busy_guard_rejects_command() {
        let executor = Arc::new(RecordingExecutor::default());
        let runner = runner(None, executor.clone());
        let _permit = runner.guard.try_enter().unwrap();

        let response = runner
            .submit(PrintCommand::test_print("https://example.com/a.pdf"))
            .await;
        assert_eq!(response, busy());
        assert!(executor.requests.lock().unwrap().is_empty());
    }

    /// Memory store whose completion write always fails
    struct UnwritableStore(MemoryJobRepository);

    #[async_trait]
    impl JobRepository for UnwritableStore {
        async fn ping(&self) -> RepositoryResult<()> {
            self.0.ping().await
        }

        async fn fetch_oldest_pending(&self) -> RepositoryResult<Option<Job>> {
            self.0.fetch_oldest_pending().await
        }

        async fn find(&self, job_id: Uuid) -> RepositoryResult<Option<Job>> {
            self.0.find(job_id).await
        }

        async fn claim(&self, job_id: Uuid, agent_id: &str) -> RepositoryResult<Option<Job>> {
            self.0.claim(job_id, agent_id).await
        }

        async fn mark_completed(&self, _job_id: Uuid) -> RepositoryResult<()> {
            Err(RepositoryError::Unavailable("connection reset".to_string()))
        }

        async fn mark_status(&self, job_id: Uuid, status: JobStatus) -> RepositoryResult<()> {
            self.0.mark_status(job_id, status).await
        }
    }

    #[tokio::test]
    async fn test_printed_job_reports_success_when_completion_write_fails() {
        let memory = MemoryJobRepository::new();
        let id = memory.insert_pending("A-1", "https://example.com/a.pdf");
        let store: Arc<dyn JobRepository> = Arc::new(UnwritableStore(memory));
        let executor = Arc::new(RecordingExecutor::default());
        let runner = Arc::new(JobRunner::new("agent-a", Some(store), executor.clone()));

        let response = runner.submit(PrintCommand::for_job(id.to_string())).await;

        assert!(response.success);
        assert_eq!(response.message, COMPLETED);
        assert!(response.error.unwrap().contains("connection reset"));
        assert_eq!(executor.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unservable_command_leaves_job_unclaimed() {
        /// Has no printer to resolve
        struct NoPrinterExecutor;

        #[async_trait]
        impl ExecutionService for NoPrinterExecutor {
            fn check(&self, _request: &DeliveryRequest) -> Result<(), PrintError> {
                Err(PrintError::MissingPrinter)
            }

            async fn deliver(&self, _request: &DeliveryRequest) -> Result<(), PrintError> {
                panic!("deliver called for an unservable command");
            }
        }

        let repo = Arc::new(MemoryJobRepository::new());
        let id = repo.insert_pending("A-1", "https://example.com/a.pdf");
        let jobs: Arc<dyn JobRepository> = repo.clone();
        let runner = Arc::new(JobRunner::new("agent-a", Some(jobs), Arc::new(NoPrinterExecutor)));

        let response = runner.submit(PrintCommand::for_job(id.to_string())).await;

        assert_eq!(
            response,
            PrintResponse::failure(FAILED, PrintError::MissingPrinter.to_string())
        );
        let job = repo.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.claimed_by.is_none());
    }
}
