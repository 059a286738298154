//! Spooler Store Client
//!
//! A typed HTTP client for the shared `print_jobs` table exposed through a
//! PostgREST-compatible API (for example a Supabase project).
//!
//! The agent uses it as one of its job store backends, the CLI uses it to
//! inspect and enqueue jobs.
//!
//! # Example
//!
//! ```no_run
//! use spooler_client::StoreClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = StoreClient::new("https://project.supabase.co", "service-role-key");
//!
//!     if let Some(job) = client.fetch_oldest_pending().await? {
//!         println!("Next job: {} ({})", job.id, job.order_id);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Table holding the print queue
pub const JOBS_TABLE: &str = "print_jobs";

/// HTTP client for the job store API
///
/// Every request carries the service key both as `apikey` and as a bearer
/// token, which is what PostgREST gateways expect.
#[derive(Debug, Clone)]
pub struct StoreClient {
    /// Base URL of the project (e.g., "https://project.supabase.co")
    base_url: String,
    /// Service key sent with every request
    api_key: String,
    /// HTTP client instance
    client: Client,
}

impl StoreClient {
    /// Create a new store client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the project
    /// * `api_key` - Service key used to authenticate
    ///
    /// # Example
    /// ```
    /// use spooler_client::StoreClient;
    ///
    /// let client = StoreClient::new("https://project.supabase.co", "key");
    /// ```
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(base_url, api_key, Client::new())
    }

    /// Create a new store client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Get the base URL of the store
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a table endpoint
    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Authentication headers shared by every request
    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| ClientError::InvalidRequest("API key is not a valid header".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| ClientError::InvalidRequest("API key is not a valid header".into()))?;
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Attach authentication to a request
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.headers(self.auth_headers()?))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::from_body(status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::from_body(status.as_u16(), &error_text));
        }

        Ok(())
    }
}
