//! LISTEN/NOTIFY notifier

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tracing::{debug, warn};

use super::{ChangeNotifier, PendingHint, Subscription};

/// Channel the insert trigger notifies on
pub const PENDING_CHANNEL: &str = "print_jobs_pending";

/// Postgres implementation of ChangeNotifier
#[derive(Clone)]
pub struct PgChangeNotifier {
    pool: PgPool,
}

impl PgChangeNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeNotifier for PgChangeNotifier {
    async fn subscribe(&self) -> anyhow::Result<Box<dyn Subscription>> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .context("Failed to open listener connection")?;
        listener
            .listen(PENDING_CHANNEL)
            .await
            .with_context(|| format!("Failed to LISTEN on {}", PENDING_CHANNEL))?;

        debug!("Listening on {}", PENDING_CHANNEL);
        Ok(Box::new(PgSubscription { listener }))
    }
}

struct PgSubscription {
    listener: PgListener,
}

#[async_trait]
impl Subscription for PgSubscription {
    async fn next(&mut self) -> Option<PendingHint> {
        match self.listener.recv().await {
            Ok(notification) => Some(PendingHint {
                job_id: notification.payload().parse().ok(),
            }),
            Err(e) => {
                warn!("Listener on {} failed: {}", PENDING_CHANNEL, e);
                None
            }
        }
    }
}
