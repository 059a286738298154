//! Notifier pump
//!
//! Forwards hints from a `ChangeNotifier` to the runner and keeps the
//! subscription alive. Subscription failures are logged and end in
//! poll-only mode; they never stop the agent.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::ChangeNotifier;
use crate::scheduler::{JobRunner, RetryPolicy};

/// Spawns the task pumping notifier events into `runner.trigger()`
pub fn spawn_notifier_pump(
    notifier: Arc<dyn ChangeNotifier>,
    runner: Arc<JobRunner>,
    policy: RetryPolicy,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let subscribe = policy.run("Change notifier subscription", || notifier.subscribe());

            let mut subscription = tokio::select! {
                _ = token.cancelled() => break,
                result = subscribe => match result {
                    Ok(subscription) => subscription,
                    Err(e) => {
                        error!("Change notifier unavailable, continuing with polling only: {:#}", e);
                        break;
                    }
                },
            };

            runner.set_notifier_active(true);
            info!("Change notifier subscribed");

            // Rows inserted while unsubscribed were never announced
            runner.trigger();

            let dropped = loop {
                tokio::select! {
                    _ = token.cancelled() => break false,
                    hint = subscription.next() => match hint {
                        Some(hint) => {
                            debug!("Pending job hint: {:?}", hint.job_id);
                            runner.trigger();
                        }
                        None => break true,
                    },
                }
            };

            runner.set_notifier_active(false);
            if !dropped {
                break;
            }

            warn!("Change notifier stream dropped, resubscribing in {:?}", policy.delay);
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(policy.delay) => {}
            }
        }

        runner.set_notifier_active(false);
        debug!("Notifier pump stopped");
    })
}
