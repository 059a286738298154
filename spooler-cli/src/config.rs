//! Configuration module
//!
//! Agent and store endpoints shared by every command.

use anyhow::{Result, bail};
use spooler_client::StoreClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the agent control API
    pub agent_url: String,
    /// Base URL of the job store API, if any
    pub store_url: Option<String>,
    /// Service key for the job store API
    pub store_key: Option<String>,
}

impl Config {
    /// Whether the job store can be reached from this CLI
    pub fn has_store(&self) -> bool {
        self.store_url.is_some() && self.store_key.is_some()
    }

    /// Build a store client from the configured URL and key
    pub fn store_client(&self) -> Result<StoreClient> {
        match (&self.store_url, &self.store_key) {
            (Some(url), Some(key)) => Ok(StoreClient::new(url, key)),
            (None, _) => bail!("No job store configured (set --store-url or STORE_URL)"),
            (_, None) => bail!("No store key configured (set --store-key or STORE_KEY)"),
        }
    }
}
