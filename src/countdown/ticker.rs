/// Periodic countdown recomputation
///
/// A single tokio task recomputes the full countdown on every tick and
/// publishes it on a watch channel. Readers fan out from the receiver.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::calculator::{compute_countdown, CountdownResult};
use super::clock::Clock;
use super::timezone::TimezoneProjector;
use crate::error::Result;

/// What the ticker counts down to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTarget {
    pub year: i32,
    pub zone: Option<String>,
}

/// Handle to a running ticker. Dropping it cancels the ticker.
pub struct CountdownTicker {
    receiver: watch::Receiver<CountdownResult>,
    task: JoinHandle<()>,
}

impl CountdownTicker {
    /// Start ticking. The first result is computed synchronously so bad
    /// input (unknown zone, unrepresentable year) is reported here.
    pub fn spawn(
        target: CountdownTarget,
        period: Duration,
        clock: Arc<dyn Clock>,
        projector: Arc<dyn TimezoneProjector + Send + Sync>,
    ) -> Result<Self> {
        let first = compute_countdown(
            clock.now(),
            target.year,
            target.zone.as_deref(),
            projector.as_ref(),
        )?;
        let (sender, receiver) = watch::channel(first);

        info!(year = target.year, zone = ?target.zone, "countdown ticker started");

        let task = tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately and was already published
            ticks.tick().await;

            loop {
                ticks.tick().await;
                let result = match compute_countdown(
                    clock.now(),
                    target.year,
                    target.zone.as_deref(),
                    projector.as_ref(),
                ) {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("countdown recomputation failed: {e}");
                        continue;
                    }
                };
                if sender.send(result).is_err() {
                    debug!("all countdown receivers dropped, stopping ticker");
                    break;
                }
            }
        });

        Ok(Self { receiver, task })
    }

    /// The most recently published result
    #[cfg(test)]
    pub fn current(&self) -> CountdownResult {
        *self.receiver.borrow()
    }

    /// A new receiver for read-only consumers
    pub fn subscribe(&self) -> watch::Receiver<CountdownResult> {
        self.receiver.clone()
    }

    /// Stop ticking immediately. No further result is published.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            info!("countdown ticker cancelled");
        }
        self.task.abort();
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
