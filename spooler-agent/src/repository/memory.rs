//! In-process jobs repository
//!
//! A single shared table guarded by a mutex. Every conditional update runs
//! under the lock, which gives it the same compare-and-set semantics as the
//! SQL backend. Several agents sharing one `MemoryJobRepository` behave like
//! several machines sharing one database.

use async_trait::async_trait;
use chrono::Utc;
use spooler_core::domain::job::{Job, JobStatus};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::jobs::{JobRepository, RepositoryError, RepositoryResult};

const NOTIFY_CAPACITY: usize = 64;

/// In-memory implementation of JobRepository
pub struct MemoryJobRepository {
    jobs: Mutex<Vec<Job>>,
    writes: AtomicUsize,
    offline: AtomicBool,
    pending_tx: broadcast::Sender<Uuid>,
}

impl MemoryJobRepository {
    pub fn new() -> Self {
        let (pending_tx, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            jobs: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
            pending_tx,
        }
    }

    /// Inserts a row as-is and announces it if it is pending
    pub fn insert(&self, job: Job) -> Uuid {
        let id = job.id;
        let pending = job.status == JobStatus::Pending;
        self.table().push(job);
        if pending {
            // No subscribers is fine
            let _ = self.pending_tx.send(id);
        }
        id
    }

    /// Inserts a fresh pending job
    pub fn insert_pending(&self, order_id: &str, label_url: &str) -> Uuid {
        self.insert(Job::pending(order_id, label_url))
    }

    pub fn get(&self, job_id: Uuid) -> Option<Job> {
        self.table().iter().find(|j| j.id == job_id).cloned()
    }

    /// Snapshot of every row
    pub fn jobs(&self) -> Vec<Job> {
        self.table().clone()
    }

    /// Number of writes issued by agents (claims and status updates)
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Receiver of pending-row announcements, one per inserted pending job
    pub fn subscribe(&self) -> broadcast::Receiver<Uuid> {
        self.pending_tx.subscribe()
    }

    /// Makes every operation fail as if the store were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn table(&self) -> MutexGuard<'_, Vec<Job>> {
        // A panic while holding the lock leaves the rows intact
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_online(&self) -> RepositoryResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn update<F>(&self, job_id: Uuid, apply: F) -> RepositoryResult<()>
    where
        F: FnOnce(&mut Job),
    {
        self.check_online()?;
        self.writes.fetch_add(1, Ordering::SeqCst);

        let mut jobs = self.table();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(RepositoryError::NotFound(job_id))?;
        apply(job);
        job.updated_at = Utc::now();
        Ok(())
    }
}

impl Default for MemoryJobRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobRepository for MemoryJobRepository {
    async fn ping(&self) -> RepositoryResult<()> {
        self.check_online()
    }

    async fn fetch_oldest_pending(&self) -> RepositoryResult<Option<Job>> {
        self.check_online()?;

        Ok(self
            .table()
            .iter()
            .filter(|j| j.is_claimable())
            .min_by_key(|j| j.created_at)
            .cloned())
    }

    async fn find(&self, job_id: Uuid) -> RepositoryResult<Option<Job>> {
        self.check_online()?;
        Ok(self.get(job_id))
    }

    async fn claim(&self, job_id: Uuid, agent_id: &str) -> RepositoryResult<Option<Job>> {
        self.check_online()?;
        self.writes.fetch_add(1, Ordering::SeqCst);

        let mut jobs = self.table();
        let Some(job) = jobs.iter_mut().find(|j| j.id == job_id && j.is_claimable()) else {
            return Ok(None);
        };

        let now = Utc::now();
        job.status = JobStatus::Printing;
        job.claimed_by = Some(agent_id.to_string());
        job.claimed_at = Some(now);
        job.updated_at = now;

        Ok(Some(job.clone()))
    }

    async fn mark_completed(&self, job_id: Uuid) -> RepositoryResult<()> {
        self.update(job_id, |job| {
            job.status = JobStatus::Completed;
            job.printed_at = Some(Utc::now());
        })
    }

    async fn mark_status(&self, job_id: Uuid, status: JobStatus) -> RepositoryResult<()> {
        self.update(job_id, |job| job.status = status)
    }
}
