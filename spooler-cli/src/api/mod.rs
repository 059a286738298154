//! API client module
//!
//! HTTP client for the control API of a running print agent.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use spooler_core::dto::agent::AgentStatus;
use spooler_core::dto::command::{PrintCommand, PrintResponse};

/// HTTP client for the agent control API
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the agent control API
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Submit a print command and wait for its outcome
    ///
    /// # Arguments
    /// * `command` - The command to run
    ///
    /// # Returns
    /// The agent's response; a failed print is still `Ok`
    pub async fn print(&self, command: &PrintCommand) -> Result<PrintResponse> {
        let url = format!("{}/print", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(command)
            .send()
            .await
            .context("Failed to send print command")?;

        self.handle_response(response).await
    }

    /// Get the agent status snapshot
    pub async fn status(&self) -> Result<AgentStatus> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach agent")?;

        self.handle_response(response).await
    }

    /// Ask the agent to consider the next pending job
    pub async fn trigger(&self) -> Result<()> {
        let url = format!("{}/trigger", self.base_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .context("Failed to send trigger request")?;

        if response.status() != StatusCode::ACCEPTED {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Request failed with status {}: {}", status, error_text);
        }

        Ok(())
    }

    /// Handle API response and deserialize JSON
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Request failed with status {}: {}", status, error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse response JSON")
    }
}
