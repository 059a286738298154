//! Postgres jobs repository
//!
//! Talks to the `print_jobs` table directly. The claim is a single
//! `UPDATE ... WHERE ... RETURNING` statement, so the row lock taken by the
//! update decides the race between agents.

use async_trait::async_trait;
use spooler_core::domain::job::{Job, JobStatus};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::jobs::{JobRepository, RepositoryError, RepositoryResult};

/// SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

const JOB_COLUMNS: &str = "id, order_id, label_url, status, claimed_by, claimed_at, printed_at, \
     retries, last_tried_at, created_at, updated_at, printer_name, copies, paper_size, orientation";

/// Postgres implementation of JobRepository
#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1 FROM print_jobs LIMIT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_oldest_pending(&self) -> RepositoryResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM print_jobs
            WHERE status = 'pending' AND claimed_by IS NULL
            ORDER BY created_at ASC
            LIMIT 1
            "#
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn find(&self, job_id: Uuid) -> RepositoryResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM print_jobs WHERE id = $1"
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn claim(&self, job_id: Uuid, agent_id: &str) -> RepositoryResult<Option<Job>> {
        let result = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE print_jobs
            SET status = 'printing', claimed_by = $2, claimed_at = now(), updated_at = now()
            WHERE id = $1 AND status = 'pending' AND claimed_by IS NULL
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => row.map(Job::try_from).transpose(),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                debug!("Claim of job {} hit a unique violation", job_id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_completed(&self, job_id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE print_jobs
            SET status = 'completed', printed_at = now(), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(job_id));
        }

        Ok(())
    }

    async fn mark_status(&self, job_id: Uuid, status: JobStatus) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE print_jobs
            SET status = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(job_id));
        }

        Ok(())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    order_id: String,
    label_url: String,
    status: String,
    claimed_by: Option<String>,
    claimed_at: Option<chrono::DateTime<chrono::Utc>>,
    printed_at: Option<chrono::DateTime<chrono::Utc>>,
    retries: i32,
    last_tried_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    printer_name: Option<String>,
    copies: Option<i32>,
    paper_size: Option<String>,
    orientation: Option<String>,
}

impl TryFrom<JobRow> for Job {
    type Error = RepositoryError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<JobStatus>()
            .map_err(|e| RepositoryError::InvalidRow(format!("job {}: {}", row.id, e)))?;

        Ok(Job {
            id: row.id,
            order_id: row.order_id,
            label_url: row.label_url,
            status,
            claimed_by: row.claimed_by,
            claimed_at: row.claimed_at,
            printed_at: row.printed_at,
            retries: row.retries,
            last_tried_at: row.last_tried_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            printer_name: row.printer_name,
            copies: row.copies,
            paper_size: row.paper_size,
            orientation: row.orientation,
        })
    }
}
