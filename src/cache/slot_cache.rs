//! Shared Slot Cache
//!
//! Thread-safe handle around [`CacheStore`] plus the fetch coordination built
//! on its pending set: request-path lookups that fetch on a miss, and
//! deduplicated background prefetches.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore, Claim, EntrySnapshot, Slot};
use crate::config::Config;
use crate::error::Result;

// == Lookup ==
/// Value returned by [`SlotCache::lookup_or_fetch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<V> {
    pub value: V,
    /// True when the value came from a live cache entry
    pub cached: bool,
}

// == Prefetch Outcome ==
/// What a call to [`SlotCache::prefetch`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// A live entry existed, no fetch issued
    AlreadyCached,
    /// Another fetch for the slot was in flight, no fetch issued
    InFlight,
    /// Fetched and stored
    Fetched,
    /// The fetch failed; nothing stored and the pending mark released
    Failed,
}

// == Slot Cache ==
/// Cloneable handle to the process-wide slot cache.
///
/// Created once at startup and shared by request handlers and background
/// tasks. All state lives behind one mutex which is only held for the
/// duration of a single cache operation, never across a fetch.
#[derive(Debug)]
pub struct SlotCache<V> {
    inner: Arc<Mutex<CacheStore<V>>>,
}

impl<V> Clone for SlotCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> SlotCache<V> {
    /// Creates a cache holding at most `max_entries` slots for `ttl` each.
    pub fn new(max_entries: usize, ttl: Duration) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(CacheStore::new(max_entries, ttl)?)),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.max_entries, config.cache_ttl())
    }

    pub fn get(&self, slot: Slot) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().get(slot)
    }

    pub fn set(&self, slot: Slot, value: V) {
        let evicted = self.inner.lock().set(slot, value);
        if !evicted.is_empty() {
            debug!(slot, ?evicted, "Evicted least recently used slots");
        }
    }

    pub fn is_pending(&self, slot: Slot) -> bool {
        self.inner.lock().is_pending(slot)
    }

    pub fn mark_pending(&self, slot: Slot) {
        self.inner.lock().mark_pending(slot);
    }

    pub fn unmark_pending(&self, slot: Slot) {
        self.inner.lock().unmark_pending(slot);
    }

    /// Live entries, least recently used first.
    pub fn entries(&self) -> Vec<EntrySnapshot> {
        self.inner.lock().entries()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.lock().ttl()
    }

    pub fn cleanup_expired(&self) -> usize {
        self.inner.lock().cleanup_expired()
    }

    // == Lookup Or Fetch ==
    /// Returns the cached value for `slot`, fetching and storing it on a miss.
    ///
    /// The fetch runs on the caller's task. If no other fetch for the slot is
    /// in flight, the slot is marked pending for the duration so background
    /// prefetches skip it. A failing fetch stores nothing and its error is
    /// returned to the caller.
    pub async fn lookup_or_fetch<F, Fut, E>(
        &self,
        slot: Slot,
        fetch: F,
    ) -> std::result::Result<Lookup<V>, E>
    where
        V: Clone,
        F: FnOnce(Slot) -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let claimed = {
            let mut store = self.inner.lock();
            if let Some(value) = store.get(slot) {
                return Ok(Lookup {
                    value,
                    cached: true,
                });
            }
            store.mark_pending(slot)
        };

        let guard = claimed.then(|| PendingGuard::new(self.clone(), slot));
        let value = fetch(slot).await?;

        match guard {
            Some(guard) => guard.complete(value.clone()),
            None => self.set(slot, value.clone()),
        }

        Ok(Lookup {
            value,
            cached: false,
        })
    }

    // == Prefetch ==
    /// Warms the cache for `slot` unless it is already cached or being fetched.
    ///
    /// The cache check and the pending mark are taken under one lock, so of
    /// any number of concurrent callers for the same slot only one runs
    /// `fetch`. Errors are logged and swallowed; the pending mark is always
    /// released so a later call can retry.
    pub async fn prefetch<F, Fut, E>(&self, slot: Slot, fetch: F) -> PrefetchOutcome
    where
        F: FnOnce(Slot) -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        E: Display,
    {
        let claim = {
            let mut store = self.inner.lock();
            let claim = store.try_claim(slot);
            if claim == Claim::Claimed {
                store.stats_mut().record_prefetch_started();
            }
            claim
        };

        match claim {
            Claim::Cached => return PrefetchOutcome::AlreadyCached,
            Claim::InFlight => return PrefetchOutcome::InFlight,
            Claim::Claimed => {}
        }

        let guard = PendingGuard::new(self.clone(), slot);
        match fetch(slot).await {
            Ok(value) => {
                guard.complete(value);
                debug!(slot, "Prefetched slot");
                PrefetchOutcome::Fetched
            }
            Err(error) => {
                self.inner.lock().stats_mut().record_prefetch_failed();
                warn!(slot, %error, "Prefetch failed");
                PrefetchOutcome::Failed
            }
        }
    }
}

// == Pending Guard ==
/// Holds a slot's pending mark and releases it when dropped.
///
/// Dropping the guard covers every way a fetch can end without storing a
/// value: an error, a panic unwinding through the task, or the future
/// being dropped.
#[derive(Debug)]
pub struct PendingGuard<V> {
    cache: SlotCache<V>,
    slot: Slot,
    armed: bool,
}

impl<V> PendingGuard<V> {
    fn new(cache: SlotCache<V>, slot: Slot) -> Self {
        Self {
            cache,
            slot,
            armed: true,
        }
    }

    /// Stores the fetched value; `set` clears the pending mark itself.
    fn complete(mut self, value: V) {
        self.cache.set(self.slot, value);
        self.armed = false;
    }
}

impl<V> Drop for PendingGuard<V> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.unmark_pending(self.slot);
        }
    }
}
