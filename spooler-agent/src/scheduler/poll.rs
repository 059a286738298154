//! Periodic poll trigger
//!
//! Push notifications are hints and can be missed, so the runner is also
//! triggered on a fixed interval.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::runner::JobRunner;

/// Spawns the poll loop; the first tick fires one `interval` after start
pub fn spawn_poll_loop(
    runner: Arc<JobRunner>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting poll loop (interval: {:?})", interval);

        let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    debug!("Poll tick");
                    runner.trigger();
                }
            }
        }

        debug!("Poll loop stopped");
    })
}
