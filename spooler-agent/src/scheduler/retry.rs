//! Fixed-backoff retry policy
//!
//! Used for store initialization and notifier subscription. Print retries
//! use the same policy shape but are driven by the runner's timer instead.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Bounded retry with a constant delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay between two attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Store initialization: one attempt plus 3 retries, 5 seconds apart
    pub fn store_init() -> Self {
        Self::new(4, Duration::from_secs(5))
    }

    /// Runs `op` until it succeeds or the attempts are exhausted
    ///
    /// Returns the last error when every attempt failed.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("{} succeeded after {} attempt(s)", what, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= self.max_attempts => {
                    warn!("{} failed after {} attempts: {:#}", what, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "{} failed (attempt {}/{}): {:#}; retrying in {:?}",
                        what, attempt, self.max_attempts, e, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::store_init()
    }
}
