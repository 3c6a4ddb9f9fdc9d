//! Periodic dispatch of coalesced reload signals.

use crate::notify::{Drain, QueueReceiver};
use crate::reload::ReloadClient;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Default interval between dispatch passes.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Drains the pending queue once per tick and issues at most one reload per
/// pass.
///
/// A burst of any size between two ticks turns into a single call. Failed
/// calls are logged and dropped; the next write decides whether another
/// attempt happens.
pub(crate) struct DispatchLoop {
    pub(crate) queue: QueueReceiver,
    pub(crate) client: ReloadClient,
    pub(crate) endpoint: String,
    pub(crate) tick_interval: Duration,
}

impl DispatchLoop {
    /// Run until `stop` fires or the queue's producer goes away.
    ///
    /// The first pass happens one full interval after start. A reload still
    /// in flight when `stop` fires is abandoned.
    pub(crate) async fn run(mut self, stop: CancellationToken) {
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let coalesced = match self.queue.drain() {
                Drain::Idle => continue,
                Drain::Closed => break,
                Drain::Coalesced(count) => count,
            };

            debug!(coalesced, "reloading provisioned config");

            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                result = self.client.reload(&self.endpoint) => {
                    if let Err(err) = result {
                        error!(endpoint = %self.endpoint, error = %err, "failed to reload provisioned config");
                    }
                }
            }
        }

        self.queue.close();
        debug!("dispatch loop stopped");
    }
}
