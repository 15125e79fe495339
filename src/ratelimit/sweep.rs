//! Periodic eviction of idle rate limit counters.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::store::WindowedCounterStore;

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Background task that drops expired, empty counters from a store.
pub struct EvictionSweep {
    store: Arc<WindowedCounterStore>,
    interval: Duration,
}

impl EvictionSweep {
    pub fn new(store: Arc<WindowedCounterStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run a single sweep at `now`, returning the number of counters evicted.
    pub fn run_once(&self, now: DateTime<Utc>) -> usize {
        sweep(&self.store, now)
    }

    /// Spawn the sweep on the current tokio runtime.
    ///
    /// The first sweep runs one interval after start. The task runs until
    /// [`SweepHandle::stop`] is called.
    pub fn start(self) -> SweepHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let store = self.store;
        let interval = self.interval;

        let task = tokio::spawn(async move {
            info!(interval = ?interval, "Starting counter eviction sweep");

            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        sweep(&store, Utc::now());
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Counter eviction sweep shutting down");
                            break;
                        }
                    }
                }
            }
        });

        SweepHandle { shutdown_tx, task }
    }
}

fn sweep(store: &WindowedCounterStore, now: DateTime<Utc>) -> usize {
    let evicted = store.evict_expired_empty(now);
    info!(evicted, remaining = store.len(), "Counter eviction sweep finished");
    evicted
}

/// Owner handle for a running [`EvictionSweep`].
pub struct SweepHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Signal the sweep to stop and wait for it to finish.
    pub async fn stop(self) {
        // The task may already be gone; that is the state we want anyway.
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.task.await {
            warn!(error = %e, "Counter eviction sweep ended abnormally");
        }
    }
}
