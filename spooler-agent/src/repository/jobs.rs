//! Jobs repository
//!
//! The queue operations the agent needs from the shared job table:
//! - Fetching the oldest claimable job
//! - Claiming a job with a single conditional update
//! - Reconciling the final status of a claimed job

use async_trait::async_trait;
use spooler_client::ClientError;
use spooler_core::domain::job::{Job, JobStatus};
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Errors surfaced by job store backends
///
/// Losing a claim race is not an error; it is reported as `Ok(None)`.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The SQL backend failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The REST backend failed
    #[error("store API error: {0}")]
    Api(#[from] ClientError),

    /// A status update targeted a job that does not exist
    #[error("job {0} not found")]
    NotFound(Uuid),

    /// A stored row could not be mapped to a job
    #[error("invalid job row: {0}")]
    InvalidRow(String),

    /// The store is not reachable
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Repository trait for the shared print queue
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Checks that the store answers
    async fn ping(&self) -> RepositoryResult<()>;

    /// Fetches the oldest job that is pending and unclaimed
    ///
    /// Returns `None` when the queue is empty.
    async fn fetch_oldest_pending(&self) -> RepositoryResult<Option<Job>>;

    /// Reads one job by id, in any state
    async fn find(&self, job_id: Uuid) -> RepositoryResult<Option<Job>>;

    /// Claims a job for an agent
    ///
    /// Sets `status = printing`, `claimed_by` and `claimed_at` only if the
    /// job is still pending and unclaimed, as one atomic operation at the
    /// store. Returns the updated row, or `None` if another agent won.
    ///
    /// # Arguments
    /// * `job_id` - The ID of the job to claim
    /// * `agent_id` - Identity written to `claimed_by`
    async fn claim(&self, job_id: Uuid, agent_id: &str) -> RepositoryResult<Option<Job>>;

    /// Marks a claimed job as printed
    async fn mark_completed(&self, job_id: Uuid) -> RepositoryResult<()>;

    /// Sets the status of a claimed job
    ///
    /// # Arguments
    /// * `job_id` - The ID of the job to update
    /// * `status` - The new status
    async fn mark_status(&self, job_id: Uuid, status: JobStatus) -> RepositoryResult<()>;
}
