//! Background Prefetch Workers
//!
//! Fire-and-forget warm-up of slots a viewer is likely to ask for next.
//! Request handlers push slot numbers onto a bounded queue through a
//! [`PrefetchScheduler`]; a dispatcher task drains the queue and runs each
//! job on its own task, at most `prefetch_workers` at a time. Deduplication
//! against the cache and against in-flight fetches happens in
//! [`SlotCache::prefetch`].

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{Slot, SlotCache};
use crate::config::Config;
use crate::fetch::SlotFetcher;
use crate::models::SlotBids;

// == Prefetch Scheduler ==
/// Cheap, cloneable handle for queueing prefetch jobs.
///
/// Scheduling never waits: when the queue is full the job is dropped.
#[derive(Debug, Clone)]
pub struct PrefetchScheduler {
    tx: mpsc::Sender<Slot>,
    depth: u64,
}

impl PrefetchScheduler {
    /// Queues a prefetch of `slot`. Returns false if the job was dropped.
    pub fn schedule(&self, slot: Slot) -> bool {
        match self.tx.try_send(slot) {
            Ok(()) => true,
            Err(TrySendError::Full(slot)) => {
                debug!(slot, "Prefetch queue full, dropping job");
                false
            }
            Err(TrySendError::Closed(slot)) => {
                debug!(slot, "Prefetch workers stopped, dropping job");
                false
            }
        }
    }

    /// Queues prefetches for the `depth` slots after `slot`.
    ///
    /// Returns how many were accepted by the queue.
    pub fn schedule_following(&self, slot: Slot) -> usize {
        (1..=self.depth)
            .filter_map(|offset| slot.checked_add(offset))
            .filter(|next| self.schedule(*next))
            .count()
    }

    pub fn depth(&self) -> u64 {
        self.depth
    }
}

// == Worker Pool ==
/// Spawns the prefetch dispatcher.
///
/// Jobs run through [`SlotCache::prefetch`], so a slot that is already
/// cached or being fetched costs nothing. Failures are logged there and never
/// reach the scheduler. The dispatcher exits once every scheduler clone is
/// dropped; during shutdown its handle is aborted instead.
pub fn spawn_prefetch_workers(
    cache: SlotCache<Arc<SlotBids>>,
    fetcher: Arc<dyn SlotFetcher>,
    config: &Config,
) -> (PrefetchScheduler, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(config.prefetch_queue.max(1));
    let workers = config.prefetch_workers.max(1);
    let queue = config.prefetch_queue;
    let semaphore = Arc::new(Semaphore::new(workers));

    let handle = tokio::spawn(async move {
        info!(workers, queue, "Starting prefetch workers");

        while let Some(slot) = rx.recv().await {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let cache = cache.clone();
            let fetcher = Arc::clone(&fetcher);

            tokio::spawn(async move {
                let outcome = cache
                    .prefetch(slot, move |slot| async move {
                        fetcher.fetch_slot(slot).await.map(Arc::new)
                    })
                    .await;
                debug!(slot, ?outcome, "Prefetch job finished");
                drop(permit);
            });
        }

        debug!("Prefetch queue closed");
    });

    let scheduler = PrefetchScheduler {
        tx,
        depth: config.prefetch_depth,
    };
    (scheduler, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::error::FetchError;

    #[derive(Default)]
    struct StubFetcher {
        calls: AtomicUsize,
        running: AtomicUsize,
        max_running: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl SlotFetcher for StubFetcher {
        async fn fetch_slot(&self, slot: Slot) -> Result<SlotBids, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                return Err(FetchError::Empty(format!("slot {}", slot)));
            }
            Ok(SlotBids {
                slot,
                bids: vec![],
                relays: vec![],
                winning_block_hash: None,
            })
        }

        async fn latest_slot(&self) -> Result<Slot, FetchError> {
            Ok(1_000)
        }
    }

    fn config(workers: usize, queue: usize) -> Config {
        Config {
            prefetch_workers: workers,
            prefetch_queue: queue,
            prefetch_depth: 3,
            ..Config::default()
        }
    }

    fn cache() -> SlotCache<Arc<SlotBids>> {
        SlotCache::new(100, Duration::from_secs(300)).unwrap()
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_schedule_following_warms_next_slots() {
        let cache = cache();
        let fetcher = Arc::new(StubFetcher::default());
        let (scheduler, handle) =
            spawn_prefetch_workers(cache.clone(), fetcher.clone(), &config(4, 16));

        assert_eq!(scheduler.schedule_following(100), 3);
        wait_until(|| cache.len() == 3).await;

        assert!(cache.get(101).is_some());
        assert!(cache.get(103).is_some());
        assert!(cache.get(100).is_none());
        assert_eq!(cache.stats().prefetches_started, 3);

        handle.abort();
    }

    #[tokio::test]
    async fn test_duplicate_jobs_fetch_once() {
        let cache = cache();
        let fetcher = Arc::new(StubFetcher {
            delay: Duration::from_millis(20),
            ..StubFetcher::default()
        });
        let (scheduler, handle) =
            spawn_prefetch_workers(cache.clone(), fetcher.clone(), &config(4, 16));

        for _ in 0..3 {
            assert!(scheduler.schedule(5));
        }
        wait_until(|| cache.len() == 1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(!cache.is_pending(5));

        handle.abort();
    }

    #[tokio::test]
    async fn test_failed_prefetch_releases_slot() {
        let cache = cache();
        let fetcher = Arc::new(StubFetcher {
            fail: true,
            ..StubFetcher::default()
        });
        let (scheduler, handle) =
            spawn_prefetch_workers(cache.clone(), fetcher.clone(), &config(2, 8));

        scheduler.schedule(9);
        wait_until(|| cache.stats().prefetches_failed == 1).await;

        assert!(cache.is_empty());
        assert!(!cache.is_pending(9));

        handle.abort();
    }

    #[tokio::test]
    async fn test_worker_limit_bounds_concurrency() {
        let cache = cache();
        let fetcher = Arc::new(StubFetcher {
            delay: Duration::from_millis(20),
            ..StubFetcher::default()
        });
        let (scheduler, handle) =
            spawn_prefetch_workers(cache.clone(), fetcher.clone(), &config(2, 16));

        for slot in 0..6 {
            assert!(scheduler.schedule(slot));
        }
        wait_until(|| cache.len() == 6).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 6);
        assert!(fetcher.max_running.load(Ordering::SeqCst) <= 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_full_queue_drops_jobs() {
        let (tx, _rx) = mpsc::channel(2);
        let scheduler = PrefetchScheduler { tx, depth: 3 };

        assert_eq!(scheduler.schedule_following(10), 2);
        assert!(!scheduler.schedule(20));
    }

    #[tokio::test]
    async fn test_closed_queue_drops_jobs() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let scheduler = PrefetchScheduler { tx, depth: 3 };

        assert!(!scheduler.schedule(1));
        assert_eq!(scheduler.schedule_following(1), 0);
    }

    #[tokio::test]
    async fn test_schedule_following_stops_at_max_slot() {
        let (tx, _rx) = mpsc::channel(8);
        let scheduler = PrefetchScheduler { tx, depth: 3 };

        assert_eq!(scheduler.schedule_following(Slot::MAX - 1), 1);
        assert_eq!(scheduler.schedule_following(Slot::MAX), 0);
    }

    #[tokio::test]
    async fn test_dispatcher_exits_when_schedulers_dropped() {
        let (scheduler, handle) = spawn_prefetch_workers(
            cache(),
            Arc::new(StubFetcher::default()),
            &config(1, 4),
        );

        drop(scheduler);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dispatcher should stop")
            .unwrap();
    }
}
