//! Job runner
//!
//! Claims jobs from the shared queue and drives them through
//! claim -> execute -> reconcile. Every entry point (notifier hints, poll
//! ticks, manual triggers, startup) goes through `trigger`, which drops the
//! request when a print is already in flight.
//!
//! Transient print failures keep the job claimed and are retried by a timer
//! task owned by the runner. While a retry is pending no new job is claimed.
//! A job this agent cannot serve (no printer to resolve) is left unclaimed
//! for other agents.

use spooler_core::domain::job::{Job, JobStatus};
use spooler_core::dto::agent::AgentStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::guard::ExecutionGuard;
use super::retry::RetryPolicy;
use crate::repository::JobRepository;
use crate::service::{DeliveryRequest, ExecutionService};

/// Consecutive lost claims after which a drain gives up until the next trigger
const MAX_CONSECUTIVE_CLAIM_LOSSES: u32 = 5;

/// Result of one pass through the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another print holds the execution guard
    Busy,
    /// A claimed job is waiting for its retry
    RetryPending,
    /// The queue is empty
    NoJob,
    /// Another agent claimed the job first
    ClaimLost,
    Completed {
        job_id: Uuid,
    },
    /// The job can never print as stored and was marked failed
    Rejected {
        job_id: Uuid,
        reason: String,
    },
    /// This agent cannot print the job; it was left for other agents
    Unprintable {
        job_id: Uuid,
        reason: String,
    },
    /// The print failed and the job is still claimed
    Failed {
        job_id: Uuid,
        attempts: u32,
        retry_scheduled: bool,
    },
    /// The agent runs without a job store
    StoreUnavailable,
    StoreError(String),
}

/// Reconciled result of one delivery
enum Verdict {
    Completed,
    Rejected(String),
    Unprintable(String),
    RetryLater(u32),
    Exhausted(u32),
}

#[derive(Default)]
struct RetryState {
    /// Claimed job awaiting a retry
    target: Option<Uuid>,
    /// Failed attempts on the current job
    attempts: u32,
    timer: Option<JoinHandle<()>>,
}

/// Claim-and-execute pipeline of one agent
pub struct JobRunner {
    agent_id: String,
    printer_name: Option<String>,
    pub(super) jobs: Option<Arc<dyn JobRepository>>,
    pub(super) executor: Arc<dyn ExecutionService>,
    pub(super) guard: ExecutionGuard,
    retry_policy: RetryPolicy,
    retry: Mutex<RetryState>,
    notifier_active: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl JobRunner {
    /// Creates a runner; `jobs` is `None` when the store could not be reached
    pub fn new(
        agent_id: impl Into<String>,
        jobs: Option<Arc<dyn JobRepository>>,
        executor: Arc<dyn ExecutionService>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            printer_name: None,
            jobs,
            executor,
            guard: ExecutionGuard::new(),
            retry_policy: RetryPolicy::new(3, std::time::Duration::from_secs(5)),
            retry: Mutex::new(RetryState::default()),
            notifier_active: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Sets the retry ceiling and delay for transient print failures
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Default printer reported by `status`
    pub fn with_printer_name(mut self, printer_name: Option<String>) -> Self {
        self.printer_name = printer_name;
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Considers the next job in the background
    ///
    /// Keeps going while jobs complete, so one trigger drains the queue.
    pub fn trigger(self: &Arc<Self>) -> JoinHandle<RunOutcome> {
        let runner = Arc::clone(self);
        tokio::spawn(async move { runner.drain().await })
    }

    /// Runs passes until the queue is empty or the runner cannot proceed
    ///
    /// Only completed prints and lost claims continue the drain.
    pub async fn drain(self: &Arc<Self>) -> RunOutcome {
        let mut claim_losses = 0;

        loop {
            let outcome = self.run_once().await;
            match outcome {
                RunOutcome::Completed { .. } => claim_losses = 0,
                RunOutcome::ClaimLost => {
                    claim_losses += 1;
                    if claim_losses >= MAX_CONSECUTIVE_CLAIM_LOSSES {
                        debug!("Lost {} claims in a row, waiting for the next trigger", claim_losses);
                        return outcome;
                    }
                }
                _ => return outcome,
            }
        }
    }

    /// One pass: fetch the oldest pending job, claim it, print it, reconcile
    pub async fn run_once(self: &Arc<Self>) -> RunOutcome {
        if self.retry_pending() {
            debug!("Retry pending, not claiming new jobs");
            return RunOutcome::RetryPending;
        }

        let Some(permit) = self.guard.try_enter() else {
            debug!("Print in progress, trigger dropped");
            return RunOutcome::Busy;
        };

        let Some(jobs) = self.jobs.clone() else {
            debug!("No job store, skipping");
            return RunOutcome::StoreUnavailable;
        };

        let job = match jobs.fetch_oldest_pending().await {
            Ok(Some(job)) => job,
            Ok(None) => {
                debug!("No pending jobs");
                return RunOutcome::NoJob;
            }
            Err(e) => {
                warn!("Failed to fetch pending jobs: {}", e);
                return RunOutcome::StoreError(e.to_string());
            }
        };

        let request = DeliveryRequest::silent(job.label_url.clone(), job.overrides());
        match self.executor.check(&request) {
            Err(e) if e.is_local() => {
                warn!("Leaving job {} for other agents: {}", job.id, e);
                self.set_error(e.to_string());
                return RunOutcome::Unprintable {
                    job_id: job.id,
                    reason: e.to_string(),
                };
            }
            _ => {}
        }

        let job = match jobs.claim(job.id, &self.agent_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                debug!("Job {} was claimed by another agent", job.id);
                return RunOutcome::ClaimLost;
            }
            Err(e) => {
                warn!("Failed to claim job {}: {}", job.id, e);
                return RunOutcome::StoreError(e.to_string());
            }
        };

        info!("Claimed job {} (order {})", job.id, job.order_id);
        self.begin(job.id);

        let verdict = self.execute_and_reconcile(jobs.as_ref(), &job).await;
        drop(permit);

        match verdict {
            Verdict::Completed => RunOutcome::Completed { job_id: job.id },
            Verdict::Rejected(reason) => RunOutcome::Rejected {
                job_id: job.id,
                reason,
            },
            Verdict::Unprintable(reason) => RunOutcome::Unprintable {
                job_id: job.id,
                reason,
            },
            Verdict::RetryLater(attempts) => {
                self.schedule_retry(jobs, job.clone());
                RunOutcome::Failed {
                    job_id: job.id,
                    attempts,
                    retry_scheduled: true,
                }
            }
            Verdict::Exhausted(attempts) => RunOutcome::Failed {
                job_id: job.id,
                attempts,
                retry_scheduled: false,
            },
        }
    }

    /// Delivers a claimed job silently and writes the outcome back
    async fn execute_and_reconcile(&self, jobs: &dyn JobRepository, job: &Job) -> Verdict {
        let request = DeliveryRequest::silent(job.label_url.clone(), job.overrides());

        match self.executor.deliver(&request).await {
            Ok(()) => {
                self.finish();
                if let Err(e) = jobs.mark_completed(job.id).await {
                    error!("Job {} printed but could not be marked completed: {}", job.id, e);
                } else {
                    info!("Job {} completed", job.id);
                }
                Verdict::Completed
            }
            Err(e) if e.is_local() => {
                // Claimed already; the row stays printing like an exhausted job
                error!("Job {} cannot be printed by this agent: {}", job.id, e);
                self.finish();
                self.set_error(e.to_string());
                Verdict::Unprintable(e.to_string())
            }
            Err(e) if !e.is_transient() => {
                warn!("Job {} cannot be printed: {}", job.id, e);
                self.finish();
                if let Err(store) = jobs.mark_status(job.id, JobStatus::Failed).await {
                    error!("Failed to mark job {} as failed: {}", job.id, store);
                }
                Verdict::Rejected(e.to_string())
            }
            Err(e) => {
                let ceiling = self.retry_policy.max_attempts;
                let attempts = self.record_failure(job.id);

                if attempts < ceiling {
                    warn!(
                        "Print of job {} failed (attempt {}/{}): {}; retrying in {:?}",
                        job.id, attempts, ceiling, e, self.retry_policy.delay
                    );
                    Verdict::RetryLater(attempts)
                } else {
                    error!(
                        "Print of job {} failed {} times: {}; leaving it claimed",
                        job.id, attempts, e
                    );
                    self.retry_state().target = None;
                    Verdict::Exhausted(attempts)
                }
            }
        }
    }

    fn schedule_retry(self: &Arc<Self>, jobs: Arc<dyn JobRepository>, job: Job) {
        let runner = Arc::clone(self);
        let handle = tokio::spawn(async move { runner.retry_loop(jobs, job).await });

        let mut state = self.retry_state();
        if let Some(previous) = state.timer.replace(handle) {
            previous.abort();
        }
    }

    async fn retry_loop(self: Arc<Self>, jobs: Arc<dyn JobRepository>, job: Job) {
        // Whether the job is settled and the queue should be looked at again
        let settled = loop {
            tokio::time::sleep(self.retry_policy.delay).await;

            let Some(permit) = self.guard.enter().await else {
                break false;
            };
            if self.retry_state().target != Some(job.id) {
                break false;
            }

            info!("Retrying job {}", job.id);
            let verdict = self.execute_and_reconcile(jobs.as_ref(), &job).await;
            drop(permit);

            match verdict {
                Verdict::RetryLater(_) => continue,
                Verdict::Completed
                | Verdict::Rejected(_)
                | Verdict::Unprintable(_)
                | Verdict::Exhausted(_) => break true,
            }
        };

        self.retry_state().timer = None;

        // Hints that arrived during the retry window were dropped
        if settled {
            self.trigger();
        }
    }

    /// Cancels a pending retry; the job stays claimed
    pub fn cancel_retry(&self) {
        let mut state = self.retry_state();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if let Some(job_id) = state.target.take() {
            info!("Cancelled pending retry of job {}", job_id);
        }
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_state().target.is_some()
    }

    /// Failed attempts on the current or last job
    pub fn retry_attempts(&self) -> u32 {
        self.retry_state().attempts
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Records a persistent, user-visible error
    pub fn set_error(&self, message: impl Into<String>) {
        *lock(&self.last_error) = Some(message.into());
    }

    pub fn clear_error(&self) {
        *lock(&self.last_error) = None;
    }

    pub fn set_notifier_active(&self, active: bool) {
        self.notifier_active.store(active, Ordering::SeqCst);
    }

    /// Snapshot for the health endpoint
    pub fn status(&self) -> AgentStatus {
        AgentStatus {
            agent_id: self.agent_id.clone(),
            printer_name: self.printer_name.clone(),
            degraded: self.jobs.is_none(),
            notifier_active: self.notifier_active.load(Ordering::SeqCst),
            busy: self.guard.is_busy(),
            retry_attempts: self.retry_attempts(),
            last_error: lock(&self.last_error).clone(),
        }
    }

    fn begin(&self, job_id: Uuid) {
        let mut state = self.retry_state();
        state.target = None;
        state.attempts = 0;
        debug!("Retry counter reset for job {}", job_id);
    }

    fn finish(&self) {
        let mut state = self.retry_state();
        state.target = None;
        state.attempts = 0;
    }

    fn record_failure(&self, job_id: Uuid) -> u32 {
        let mut state = self.retry_state();
        state.target = Some(job_id);
        state.attempts += 1;
        state.attempts
    }

    fn retry_state(&self) -> MutexGuard<'_, RetryState> {
        lock(&self.retry)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
