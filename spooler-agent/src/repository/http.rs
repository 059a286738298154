//! REST jobs repository
//!
//! Backs the queue with a PostgREST-compatible API through `StoreClient`.
//! Claims are conditional PATCH requests evaluated by the gateway.

use async_trait::async_trait;
use spooler_client::StoreClient;
use spooler_core::domain::job::{Job, JobStatus};
use std::sync::Arc;
use uuid::Uuid;

use super::jobs::{JobRepository, RepositoryError, RepositoryResult};

/// HTTP implementation of JobRepository
#[derive(Clone)]
pub struct HttpJobRepository {
    client: Arc<StoreClient>,
}

impl HttpJobRepository {
    pub fn new(client: Arc<StoreClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobRepository for HttpJobRepository {
    async fn ping(&self) -> RepositoryResult<()> {
        self.client.ping().await.map_err(classify)
    }

    async fn fetch_oldest_pending(&self) -> RepositoryResult<Option<Job>> {
        self.client.fetch_oldest_pending().await.map_err(classify)
    }

    async fn find(&self, job_id: Uuid) -> RepositoryResult<Option<Job>> {
        match self.client.get_job(job_id).await {
            Ok(job) => Ok(Some(job)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(classify(e)),
        }
    }

    async fn claim(&self, job_id: Uuid, agent_id: &str) -> RepositoryResult<Option<Job>> {
        self.client
            .claim_job(job_id, agent_id)
            .await
            .map_err(classify)
    }

    async fn mark_completed(&self, job_id: Uuid) -> RepositoryResult<()> {
        self.client
            .mark_completed(job_id)
            .await
            .map_err(|e| not_found_or(e, job_id))
    }

    async fn mark_status(&self, job_id: Uuid, status: JobStatus) -> RepositoryResult<()> {
        self.client
            .update_job_status(job_id, status)
            .await
            .map_err(|e| not_found_or(e, job_id))
    }
}

fn not_found_or(error: spooler_client::ClientError, job_id: Uuid) -> RepositoryError {
    if error.is_not_found() {
        RepositoryError::NotFound(job_id)
    } else {
        classify(error)
    }
}

/// Gateway outages and transport failures mean the store is unreachable
fn classify(error: spooler_client::ClientError) -> RepositoryError {
    match error {
        spooler_client::ClientError::RequestFailed(e) => RepositoryError::Unavailable(e.to_string()),
        e if e.is_server_error() => RepositoryError::Unavailable(e.to_string()),
        e => RepositoryError::Api(e),
    }
}
