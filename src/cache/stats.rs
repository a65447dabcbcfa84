//! Cache Statistics Module
//!
//! Tracks cache and prefetch activity: hits, misses, expirations, evictions and
//! background fetch outcomes.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache performance counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a live entry
    pub hits: u64,
    /// Lookups that found nothing usable (absent or expired)
    pub misses: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Entries evicted to stay within capacity
    pub evictions: u64,
    /// Background prefetches that issued a fetch
    pub prefetches_started: u64,
    /// Background prefetches whose fetch failed
    pub prefetches_failed: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Slots currently being fetched
    pub pending: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_prefetch_started(&mut self) {
        self.prefetches_started += 1;
    }

    pub fn record_prefetch_failed(&mut self) {
        self.prefetches_failed += 1;
    }
}
