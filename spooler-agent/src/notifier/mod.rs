//! Change notifier layer
//!
//! Push channels announcing that a pending job may exist. Every event is a
//! hint; the runner always re-reads the queue and claims through the store.

mod memory;
mod postgres;
mod pump;

pub use memory::MemoryChangeNotifier;
pub use postgres::{PENDING_CHANNEL, PgChangeNotifier};
pub use pump::spawn_notifier_pump;

use async_trait::async_trait;
use uuid::Uuid;

/// A "new pending job" hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingHint {
    /// The announced job, when the channel carried one
    pub job_id: Option<Uuid>,
}

/// Source of pending-job subscriptions
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Opens a new subscription
    async fn subscribe(&self) -> anyhow::Result<Box<dyn Subscription>>;
}

/// An open stream of hints
#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next hint; `None` means the stream dropped
    async fn next(&mut self) -> Option<PendingHint>;
}
