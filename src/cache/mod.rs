//! Cache Module
//!
//! In-memory slot result cache with TTL expiration, LRU eviction and
//! deduplicated fetching.

mod entry;
mod lru;
mod slot_cache;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use slot_cache::{Lookup, PrefetchOutcome, SlotCache};
pub use stats::CacheStats;
pub use store::{CacheStore, Claim, EntrySnapshot};

/// Slot number, the cache key.
pub type Slot = u64;
