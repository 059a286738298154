//! Broadcast notifier for the in-process store

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use uuid::Uuid;

use super::{ChangeNotifier, PendingHint, Subscription};
use crate::repository::MemoryJobRepository;

/// In-memory implementation of ChangeNotifier
#[derive(Clone)]
pub struct MemoryChangeNotifier {
    repo: Arc<MemoryJobRepository>,
}

impl MemoryChangeNotifier {
    pub fn new(repo: Arc<MemoryJobRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ChangeNotifier for MemoryChangeNotifier {
    async fn subscribe(&self) -> anyhow::Result<Box<dyn Subscription>> {
        Ok(Box::new(MemorySubscription {
            rx: self.repo.subscribe(),
        }))
    }
}

struct MemorySubscription {
    rx: Receiver<Uuid>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Option<PendingHint> {
        match self.rx.recv().await {
            Ok(id) => Some(PendingHint { job_id: Some(id) }),
            // Missed events still mean there is work to look at
            Err(RecvError::Lagged(_)) => Some(PendingHint { job_id: None }),
            Err(RecvError::Closed) => None,
        }
    }
}
