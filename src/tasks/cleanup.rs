//! Expired Slot Sweep
//!
//! Background task that periodically removes expired cache entries, so slots
//! nobody asks for again do not hold memory until they are evicted.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SlotCache;

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// Reads already treat expired entries as absent; the sweep only reclaims
/// their memory. The returned handle is aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = SlotCache::new(100, Duration::from_secs(300))?;
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(cache: SlotCache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Send + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Starting expired slot sweep");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired();
            if removed > 0 {
                info!(removed, remaining = cache.len(), "Swept expired slots");
            } else {
                debug!("Sweep found no expired slots");
            }
        }
    })
}
