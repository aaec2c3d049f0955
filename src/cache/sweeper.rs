//! Periodic purge of expired cache entries
//!
//! The sweeper is owned by whoever runs the process (the server runtime) and
//! must be shut down explicitly. It never touches caches outside its timer
//! ticks, so request handling and sweeping only meet at the cache lock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::Sweepable;

/// Handle to the running background sweep task
pub struct CacheSweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    /// Spawn the sweep task on the current tokio runtime
    ///
    /// The first sweep happens one full `every` after start.
    pub fn start(caches: Vec<Arc<dyn Sweepable>>, every: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!(
                interval_secs = every.as_secs(),
                caches = caches.len(),
                "Cache sweeper started"
            );

            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately; skip that tick
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        for cache in &caches {
                            let removed = cache.sweep().await;
                            if removed > 0 {
                                debug!(cache = cache.name(), removed, "Swept expired entries");
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Cache sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown_tx, handle }
    }

    /// Whether the background task has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the task to stop and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.handle.await {
            warn!(error = %e, "Cache sweeper task ended abnormally");
        }
    }
}
