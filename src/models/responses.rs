//! Response DTOs for the slot bid API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheStats, EntrySnapshot, Slot};
use crate::models::SlotBids;

/// Response body for GET /api/slot/:slot
#[derive(Debug, Clone, Serialize)]
pub struct SlotResponse {
    #[serde(flatten)]
    pub data: Arc<SlotBids>,
    /// True when served from the cache
    pub cached: bool,
}

impl SlotResponse {
    pub fn new(data: Arc<SlotBids>, cached: bool) -> Self {
        Self { data, cached }
    }
}

/// Response body for GET /api/latest-slot
#[derive(Debug, Clone, Serialize)]
pub struct LatestSlotResponse {
    pub slot: Slot,
    pub head_offset: u64,
}

/// Response body for POST /api/prefetch
#[derive(Debug, Clone, Serialize)]
pub struct PrefetchResponse {
    pub status: String,
    pub slots: Vec<Slot>,
    /// How many of the slots were accepted by the prefetch queue
    pub queued: usize,
}

impl PrefetchResponse {
    pub fn new(slots: Vec<Slot>, queued: usize) -> Self {
        Self {
            status: "prefetching".to_string(),
            slots,
            queued,
        }
    }
}

/// A known builder with its display color
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuilderInfo {
    pub pubkey: String,
    pub name: String,
    pub color: String,
}

/// Response body for GET /api/builders
#[derive(Debug, Clone, Serialize)]
pub struct BuildersResponse {
    pub builders: Vec<BuilderInfo>,
}

/// Response body for GET /api/cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntriesResponse {
    pub capacity: usize,
    pub ttl_secs: u64,
    /// Live entries, least recently used first
    pub entries: Vec<EntrySnapshot>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
