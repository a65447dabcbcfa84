//! Request DTOs for the slot bid API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::Slot;

/// Largest batch accepted by POST /api/prefetch
pub const MAX_PREFETCH_BATCH: usize = 64;

/// Request body for POST /api/prefetch: a bare JSON array of slots.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct PrefetchRequest {
    pub slots: Vec<Slot>,
}

impl PrefetchRequest {
    /// Validates the request data
    ///
    /// An empty list is valid and queues nothing. Returns an error message if
    /// validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.slots.len() > MAX_PREFETCH_BATCH {
            return Some(format!(
                "At most {} slots can be prefetched per request",
                MAX_PREFETCH_BATCH
            ));
        }
        None
    }
}
