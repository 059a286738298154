//! ID resolver module
//!
//! Resolves job id prefixes to full UUIDs by querying the job store, so
//! operators can type the first few characters of an id.

use anyhow::{Context, Result, anyhow};
use spooler_client::StoreClient;
use spooler_core::domain::job::Job;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Recent jobs searched when resolving a prefix
const RESOLVE_WINDOW: usize = 500;

/// Resolve a job ID or prefix to a full UUID
///
/// A full UUID is returned as-is without touching the store.
///
/// # Errors
/// Returns an error if no job or more than one job matches the prefix, or
/// if the store cannot be queried.
pub async fn resolve_job_id(client: &StoreClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let jobs = client
        .list_jobs(RESOLVE_WINDOW)
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    pick_unique(&jobs, id_or_prefix)
}

fn pick_unique(jobs: &[Job], id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    let matches: Vec<_> = jobs.iter().filter(|j| id_or_prefix.matches(&j.id)).collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No job found with ID starting with '{}'", id_or_prefix)),
        [job] => Ok(job.id),
        _ => {
            let ids: Vec<String> = matches.iter().map(|j| j.id.to_string()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                id_or_prefix,
                ids.join(", ")
            ))
        }
    }
}
