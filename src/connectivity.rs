//! Online/offline signal for the sync trigger.
//!
//! A background task probes the backend and publishes the result on a
//! `watch` channel. While offline the probe backs off exponentially.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[async_trait]
pub trait Probe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

pub struct ConnectivityMonitor {
    probe: Arc<dyn Probe>,
    interval: Duration,
    max_interval: Duration,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn Probe>, interval: Duration, max_interval: Duration) -> Self {
        Self {
            probe,
            interval,
            max_interval: max_interval.max(interval),
        }
    }

    /// Start probing. The receiver starts at `false` (offline) and flips on
    /// the first successful probe.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> (watch::Receiver<bool>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(tx, shutdown));
        (rx, handle)
    }

    async fn run(self, tx: watch::Sender<bool>, mut shutdown: watch::Receiver<bool>) {
        let mut delay = self.interval;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let online = self.probe.is_reachable().await;
            let changed = tx.send_if_modified(|current| {
                if *current == online {
                    return false;
                }
                *current = online;
                true
            });
            if changed {
                if online {
                    tracing::info!("Connectivity regained");
                } else {
                    tracing::info!("Connectivity lost");
                }
            }

            delay = next_delay(delay, online, self.interval, self.max_interval);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                res = shutdown.changed() => {
                    if res.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Connectivity monitor stopped");
    }
}

/// Probe delay after a probe: the base interval while online, doubling up to
/// `max` while offline.
pub fn next_delay(current: Duration, online: bool, base: Duration, max: Duration) -> Duration {
    if online {
        base
    } else {
        current.saturating_mul(2).clamp(base, max.max(base))
    }
}
