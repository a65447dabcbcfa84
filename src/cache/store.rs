//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking, TTL expiration
//! and the set of slots whose fetch is in flight.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats, LruTracker, Slot};
use crate::error::{AppError, Result};

// == Claim ==
/// Outcome of trying to reserve a slot for fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// A live entry already exists; nothing to fetch
    Cached,
    /// Another fetch for the slot is in flight
    InFlight,
    /// The slot is now marked pending for the caller
    Claimed,
}

// == Entry Snapshot ==
/// Read-only view of a resident entry, for introspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot {
    pub slot: Slot,
    pub age_ms: u64,
    pub ttl_remaining_ms: u64,
}

// == Cache Store ==
/// Slot result storage with LRU eviction, TTL expiry and a pending set.
///
/// The store itself is not synchronized; [`SlotCache`](crate::cache::SlotCache)
/// wraps it in a single mutex so every operation below is atomic.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Slot payloads
    entries: HashMap<Slot, CacheEntry<V>>,
    /// Recency order over resident slots
    lru: LruTracker<Slot>,
    /// Slots with a fetch in flight
    pending: HashSet<Slot>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Lifetime of every entry
    ttl: Duration,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with the given capacity and TTL.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidConfig`] when `max_entries` is zero.
    pub fn new(max_entries: usize, ttl: Duration) -> Result<Self> {
        if max_entries == 0 {
            return Err(AppError::InvalidConfig(
                "cache capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            pending: HashSet::new(),
            stats: CacheStats::new(),
            max_entries,
            ttl,
        })
    }

    // == Set ==
    /// Stores a payload for `slot`, replacing any previous entry.
    ///
    /// The entry is stamped with the current instant and becomes the most
    /// recently used. Least recently used entries are then evicted until the
    /// store is back within capacity, and `slot` is cleared from the pending
    /// set. Returns the evicted slots.
    pub fn set(&mut self, slot: Slot, value: V) -> Vec<Slot> {
        self.entries.insert(slot, CacheEntry::new(value));
        self.lru.touch(slot);

        let mut evicted = Vec::new();
        while self.entries.len() > self.max_entries {
            let Some(oldest) = self.lru.evict_oldest() else {
                break;
            };
            self.entries.remove(&oldest);
            self.stats.record_eviction();
            evicted.push(oldest);
        }

        self.pending.remove(&slot);
        evicted
    }

    // == Get ==
    /// Retrieves the payload for `slot`.
    ///
    /// A live entry is promoted to most recently used. An expired entry is
    /// removed and reported as absent.
    pub fn get(&mut self, slot: Slot) -> Option<V>
    where
        V: Clone,
    {
        if !self.is_live(slot) {
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(slot);
        self.entries.get(&slot).map(|entry| entry.value.clone())
    }

    // == Is Live ==
    /// Checks for a live entry without touching recency or hit counters.
    ///
    /// Expired entries found here are removed.
    pub fn is_live(&mut self, slot: Slot) -> bool {
        let Some(entry) = self.entries.get(&slot) else {
            return false;
        };

        if entry.is_expired(self.ttl) {
            self.entries.remove(&slot);
            self.lru.remove(&slot);
            self.stats.record_expiration();
            return false;
        }

        true
    }

    // == Pending Set ==
    pub fn is_pending(&self, slot: Slot) -> bool {
        self.pending.contains(&slot)
    }

    /// Marks `slot` as being fetched. Returns false if it already was.
    pub fn mark_pending(&mut self, slot: Slot) -> bool {
        self.pending.insert(slot)
    }

    /// Clears the pending mark of `slot`. Returns false if it was not marked.
    pub fn unmark_pending(&mut self, slot: Slot) -> bool {
        self.pending.remove(&slot)
    }

    // == Try Claim ==
    /// Decides in one step whether the caller should fetch `slot`.
    ///
    /// Only when there is no live entry and no fetch in flight is the slot
    /// marked pending and [`Claim::Claimed`] returned.
    pub fn try_claim(&mut self, slot: Slot) -> Claim {
        if self.is_live(slot) {
            Claim::Cached
        } else if !self.mark_pending(slot) {
            Claim::InFlight
        } else {
            Claim::Claimed
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let expired: Vec<Slot> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(slot, _)| *slot)
            .collect();

        for slot in &expired {
            self.entries.remove(slot);
            self.lru.remove(slot);
            self.stats.record_expiration();
        }

        expired.len()
    }

    // == Entries ==
    /// Lists live entries from least to most recently used.
    pub fn entries(&self) -> Vec<EntrySnapshot> {
        self.lru
            .iter()
            .filter_map(|slot| {
                let entry = self.entries.get(slot)?;
                if entry.is_expired(self.ttl) {
                    return None;
                }
                Some(EntrySnapshot {
                    slot: *slot,
                    age_ms: entry.age().as_millis() as u64,
                    ttl_remaining_ms: entry.ttl_remaining(self.ttl).as_millis() as u64,
                })
            })
            .collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.pending = self.pending.len();
        stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    // == Length ==
    /// Returns the number of resident entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    fn store(max_entries: usize) -> CacheStore<&'static str> {
        CacheStore::new(max_entries, TTL).unwrap()
    }

    #[test]
    fn test_store_new() {
        let store = store(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 100);
        assert_eq!(store.ttl(), TTL);
    }

    #[test]
    fn test_store_rejects_zero_capacity() {
        let result = CacheStore::<u8>::new(0, TTL);
        assert!(matches!(result, Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(100);

        store.set(1, "bids-1");

        assert_eq!(store.get(1), Some("bids-1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_missing_is_none() {
        let mut store = store(100);
        assert_eq!(store.get(42), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = store(100);

        store.set(1, "old");
        store.set(1, "new");

        assert_eq!(store.get(1), Some("new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_overwrite_refreshes_recency() {
        let mut store = store(2);

        store.set(1, "a");
        store.set(2, "b");
        store.set(1, "a2");
        let evicted = store.set(3, "c");

        assert_eq!(evicted, vec![2]);
        assert_eq!(store.get(1), Some("a2"));
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = store(3);

        store.set(1, "a");
        store.set(2, "b");
        store.set(3, "c");
        let evicted = store.set(4, "d");

        assert_eq!(evicted, vec![1]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1), None);
        assert!(store.get(2).is_some());
        assert!(store.get(3).is_some());
        assert!(store.get(4).is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = store(2);

        store.set(1, "A");
        store.set(2, "B");
        assert_eq!(store.get(1), Some("A"));
        store.set(3, "C");

        let resident: Vec<Slot> = store.entries().iter().map(|e| e.slot).collect();
        assert_eq!(resident, vec![1, 3]);
        assert_eq!(store.get(2), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_expiration() {
        let mut store = CacheStore::new(100, Duration::from_secs(5)).unwrap();

        store.set(7, "X");

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.get(7), Some("X"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(7), None);
        assert_eq!(store.len(), 0);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_store_is_live_does_not_promote() {
        let mut store = store(2);

        store.set(1, "a");
        store.set(2, "b");
        assert!(store.is_live(1));
        store.set(3, "c");

        assert!(!store.is_live(1));
        assert_eq!(store.stats().hits, 0);
    }

    #[test]
    fn test_pending_mark_and_unmark() {
        let mut store = store(10);

        assert!(!store.is_pending(9));
        assert!(store.mark_pending(9));
        assert!(!store.mark_pending(9));
        assert!(store.is_pending(9));
        assert_eq!(store.stats().pending, 1);

        assert!(store.unmark_pending(9));
        assert!(!store.unmark_pending(9));
        assert!(!store.is_pending(9));
    }

    #[test]
    fn test_unmark_never_marked_is_noop() {
        let mut store = store(10);
        store.set(1, "a");

        assert!(!store.unmark_pending(5));
        assert!(!store.unmark_pending(5));
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().pending, 0);
    }

    #[test]
    fn test_set_clears_pending() {
        let mut store = store(10);

        store.mark_pending(9);
        assert!(store.is_pending(9));
        store.set(9, "Y");
        assert!(!store.is_pending(9));
    }

    #[test]
    fn test_try_claim() {
        let mut store = store(10);
        store.set(1, "cached");

        assert_eq!(store.try_claim(1), Claim::Cached);
        assert_eq!(store.try_claim(2), Claim::Claimed);
        assert_eq!(store.try_claim(2), Claim::InFlight);

        store.set(2, "done");
        assert_eq!(store.try_claim(2), Claim::Cached);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_claim_after_expiry() {
        let mut store = CacheStore::new(10, Duration::from_secs(5)).unwrap();
        store.set(1, "stale");

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(store.try_claim(1), Claim::Claimed);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_cleanup_expired() {
        let mut store = CacheStore::new(100, Duration::from_secs(10)).unwrap();

        store.set(1, "old");
        tokio::time::advance(Duration::from_secs(6)).await;
        store.set(2, "new");
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(2), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_snapshot() {
        let mut store = CacheStore::new(10, Duration::from_secs(60)).unwrap();

        store.set(10, "a");
        tokio::time::advance(Duration::from_secs(15)).await;
        store.set(11, "b");

        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].slot, 10);
        assert_eq!(entries[0].age_ms, 15_000);
        assert_eq!(entries[0].ttl_remaining_ms, 45_000);
        assert_eq!(entries[1].slot, 11);
        assert_eq!(entries[1].age_ms, 0);
    }
}
