//! Print job endpoints

use crate::error::{ClientError, Result};
use crate::{JOBS_TABLE, StoreClient};
use chrono::{DateTime, Utc};
use serde::Serialize;
use spooler_core::domain::job::{Job, JobStatus};
use spooler_core::dto::job::NewJob;
use tracing::debug;
use uuid::Uuid;

/// Query parameters as sent on the wire
type Params = Vec<(&'static str, String)>;

const RETURN_REPRESENTATION: &str = "return=representation";

impl StoreClient {
    // =============================================================================
    // Queue Reads
    // =============================================================================

    /// Check that the store answers and the table is readable
    pub async fn ping(&self) -> Result<()> {
        let response = self
            .authorized(self.client.get(self.table_url(JOBS_TABLE)))?
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Fetch the oldest unclaimed pending job
    ///
    /// # Returns
    /// `None` when the queue is empty
    pub async fn fetch_oldest_pending(&self) -> Result<Option<Job>> {
        let response = self
            .authorized(self.client.get(self.table_url(JOBS_TABLE)))?
            .query(&oldest_pending_params())
            .send()
            .await?;

        let jobs: Vec<Job> = self.handle_response(response).await?;
        Ok(jobs.into_iter().next())
    }

    /// List pending jobs, oldest first
    pub async fn list_pending_jobs(&self, limit: usize) -> Result<Vec<Job>> {
        let mut params = pending_filter();
        params.push(("select", "*".to_string()));
        params.push(("order", "created_at.asc".to_string()));
        params.push(("limit", limit.to_string()));

        let response = self
            .authorized(self.client.get(self.table_url(JOBS_TABLE)))?
            .query(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List the most recent jobs in any state
    pub async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>> {
        let response = self
            .authorized(self.client.get(self.table_url(JOBS_TABLE)))?
            .query(&[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        let response = self
            .authorized(self.client.get(self.table_url(JOBS_TABLE)))?
            .query(&[("select", "*".to_string()), ("id", eq(job_id))])
            .send()
            .await?;

        let jobs: Vec<Job> = self.handle_response(response).await?;
        jobs.into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound(format!("Job {}", job_id)))
    }

    // =============================================================================
    // Queue Writes
    // =============================================================================

    /// Insert a new pending job
    pub async fn enqueue_job(&self, job: &NewJob) -> Result<Job> {
        let response = self
            .authorized(self.client.post(self.table_url(JOBS_TABLE)))?
            .header("Prefer", RETURN_REPRESENTATION)
            .json(job)
            .send()
            .await?;

        let jobs: Vec<Job> = self.handle_response(response).await?;
        jobs.into_iter()
            .next()
            .ok_or_else(|| ClientError::ParseError("Insert returned no rows".to_string()))
    }

    /// Claim a job for an agent
    ///
    /// One conditional `PATCH`: the row is only updated while it is still
    /// pending and unclaimed. An empty representation, or a unique
    /// violation, means another agent got there first.
    ///
    /// # Returns
    /// The claimed row, or `None` if the claim was lost
    pub async fn claim_job(&self, job_id: Uuid, agent_id: &str) -> Result<Option<Job>> {
        let response = self
            .authorized(self.client.patch(self.table_url(JOBS_TABLE)))?
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&claim_params(job_id))
            .json(&ClaimPatch {
                status: JobStatus::Printing,
                claimed_by: agent_id,
                claimed_at: Utc::now(),
            })
            .send()
            .await?;

        match self.handle_response::<Vec<Job>>(response).await {
            Ok(jobs) => Ok(jobs.into_iter().next()),
            Err(e) if e.is_unique_violation() => {
                debug!("Claim of job {} hit a unique violation", job_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Mark a job as printed
    pub async fn mark_completed(&self, job_id: Uuid) -> Result<()> {
        let response = self
            .authorized(self.client.patch(self.table_url(JOBS_TABLE)))?
            .query(&[("id", eq(job_id))])
            .json(&CompletionPatch {
                status: JobStatus::Completed,
                printed_at: Utc::now(),
            })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Set the status of a job unconditionally
    pub async fn update_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<()> {
        let response = self
            .authorized(self.client.patch(self.table_url(JOBS_TABLE)))?
            .query(&[("id", eq(job_id))])
            .json(&StatusPatch { status })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

// =============================================================================
// Request Bodies and Filters
// =============================================================================

#[derive(Debug, Serialize)]
struct ClaimPatch<'a> {
    status: JobStatus,
    claimed_by: &'a str,
    claimed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct CompletionPatch {
    status: JobStatus,
    printed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct StatusPatch {
    status: JobStatus,
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Filter matching claimable rows
fn pending_filter() -> Params {
    vec![
        ("status", eq(JobStatus::Pending)),
        ("claimed_by", "is.null".to_string()),
    ]
}

fn oldest_pending_params() -> Params {
    let mut params = pending_filter();
    params.push(("select", "*".to_string()));
    params.push(("order", "created_at.asc".to_string()));
    params.push(("limit", "1".to_string()));
    params
}

/// Precondition of the conditional claim update
fn claim_params(job_id: Uuid) -> Params {
    let mut params = vec![("id", eq(job_id))];
    params.extend(pending_filter());
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_pending_params() {
        let params = oldest_pending_params();
        assert!(params.contains(&("status", "eq.pending".to_string())));
        assert!(params.contains(&("claimed_by", "is.null".to_string())));
        assert!(params.contains(&("order", "created_at.asc".to_string())));
        assert!(params.contains(&("limit", "1".to_string())));
    }

    #[test]
    fn test_claim_params_carry_full_precondition() {
        let job_id = Uuid::new_v4();
        let params = claim_params(job_id);

        assert_eq!(params[0], ("id", format!("eq.{}", job_id)));
        assert!(params.contains(&("status", "eq.pending".to_string())));
        assert!(params.contains(&("claimed_by", "is.null".to_string())));
    }

    #[test]
    fn test_claim_patch_body() {
        let body = serde_json::to_value(ClaimPatch {
            status: JobStatus::Printing,
            claimed_by: "agent-1-abc",
            claimed_at: Utc::now(),
        })
        .unwrap();

        assert_eq!(body["status"], "printing");
        assert_eq!(body["claimed_by"], "agent-1-abc");
        assert!(body["claimed_at"].is_string());
    }
}
