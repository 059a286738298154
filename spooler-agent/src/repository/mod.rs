//! Repository layer
//!
//! Repositories abstract the shared job store. The backend is selected by
//! the scheme of the store URL: Postgres talks SQL directly, REST goes
//! through a PostgREST-compatible API and memory keeps the table in-process.
//!
//! All repositories are trait-based to enable testing and mocking.

mod http;
mod jobs;
mod memory;
mod postgres;

// Re-export traits
pub use jobs::{JobRepository, RepositoryError, RepositoryResult};

// Re-export implementations
pub use http::HttpJobRepository;
pub use memory::MemoryJobRepository;
pub use postgres::PgJobRepository;

use anyhow::Context;
use spooler_client::StoreClient;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, StoreKind};
use crate::db;
use crate::notifier::{ChangeNotifier, MemoryChangeNotifier, PgChangeNotifier};
use crate::scheduler::RetryPolicy;

/// A connected job store and its push channel, if it has one
#[derive(Clone)]
pub struct Backend {
    pub jobs: Arc<dyn JobRepository>,
    pub notifier: Option<Arc<dyn ChangeNotifier>>,
}

impl Backend {
    /// Backend over an in-process table
    pub fn memory(repo: Arc<MemoryJobRepository>) -> Self {
        Self {
            notifier: Some(Arc::new(MemoryChangeNotifier::new(Arc::clone(&repo)))),
            jobs: repo,
        }
    }
}

/// Connects to the store named by the configuration and checks it answers
pub async fn connect(config: &Config) -> anyhow::Result<Backend> {
    let backend = match config.store_kind()? {
        StoreKind::Postgres => {
            let pool = db::create_pool(config.require_store_url()?)
                .await
                .context("Failed to create database pool")?;

            if config.run_migrations {
                db::run_migrations(&pool)
                    .await
                    .context("Failed to run database migrations")?;
            }

            Backend {
                jobs: Arc::new(PgJobRepository::new(pool.clone())),
                notifier: Some(Arc::new(PgChangeNotifier::new(pool))),
            }
        }
        StoreKind::Rest => {
            let key = config.store_key.clone().unwrap_or_default();
            let http = reqwest::Client::builder()
                .timeout(config.fetch_timeout)
                .build()
                .context("Failed to build HTTP client")?;
            let client = StoreClient::with_client(config.require_store_url()?, key, http);

            Backend {
                jobs: Arc::new(HttpJobRepository::new(Arc::new(client))),
                notifier: None,
            }
        }
        StoreKind::Memory => Backend::memory(Arc::new(MemoryJobRepository::new())),
    };

    backend
        .jobs
        .ping()
        .await
        .context("Job store did not answer")?;

    Ok(backend)
}

/// Connects with bounded fixed backoff
///
/// Returns the last error when every attempt failed.
pub async fn connect_with_retry(config: &Config, policy: RetryPolicy) -> anyhow::Result<Backend> {
    let backend = policy
        .run("Job store initialization", || connect(config))
        .await?;
    info!("Job store connected ({:?})", config.store_kind()?);
    Ok(backend)
}
