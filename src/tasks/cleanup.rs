//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::LruCache;

/// Handle to a running cleanup task.
///
/// The task stops when `shutdown` is called or when the handle is dropped.
pub struct CleanupHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CleanupHandle {
    /// Signals the task to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.task.await {
            if !err.is_cancelled() {
                warn!("Cleanup task ended abnormally: {}", err);
            }
        }
    }
}

/// A cache that can drop its expired entries on demand.
pub trait Sweep: Send + Sync + 'static {
    /// Removes every expired entry and returns how many were removed.
    fn sweep(&self) -> usize;
}

impl<V> Sweep for LruCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn sweep(&self) -> usize {
        self.cleanup_expired()
    }
}

/// Spawns a background task that sweeps expired entries out of `cache`
/// every `interval`.
///
/// A zero interval is treated as one millisecond;
/// callers that want lazy expiry only should not spawn the task.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(LruCache::<String>::new(1000, 0));
/// let cleanup = spawn_cleanup_task(cache.clone(), Duration::from_secs(60), "sessions");
/// // Later, during shutdown:
/// cleanup.shutdown().await;
/// ```
pub fn spawn_cleanup_task<C>(cache: Arc<C>, interval: Duration, name: &'static str) -> CleanupHandle
where
    C: Sweep + ?Sized,
{
    let interval = interval.max(Duration::from_millis(1));
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(
            cache = name,
            "Starting TTL cleanup task with interval of {:?}", interval
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = cache.sweep();
                    if removed > 0 {
                        info!(cache = name, "TTL cleanup: removed {} expired entries", removed);
                    } else {
                        debug!(cache = name, "TTL cleanup: no expired entries found");
                    }
                }
                // Fires on the stop signal and when the handle is dropped
                _ = shutdown_rx.changed() => break,
            }
        }

        info!(cache = name, "TTL cleanup task stopped");
    });

    CleanupHandle { shutdown_tx, task }
}
