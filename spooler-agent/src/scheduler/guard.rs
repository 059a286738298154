//! Local execution guard
//!
//! One permit per process: while a permit is alive a print is in flight.
//! The permit is released when dropped, on every exit path.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone)]
pub struct ExecutionGuard {
    semaphore: Arc<Semaphore>,
}

impl ExecutionGuard {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Takes the permit if no print is in flight
    pub fn try_enter(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }

    /// Waits for the permit
    ///
    /// Returns `None` only if the semaphore was closed.
    pub async fn enter(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().acquire_owned().await.ok()
    }

    pub fn is_busy(&self) -> bool {
        self.semaphore.available_permits() == 0
    }
}

impl Default for ExecutionGuard {
    fn default() -> Self {
        Self::new()
    }
}
