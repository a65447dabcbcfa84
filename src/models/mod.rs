//! Request, response and payload models for the slot bid API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies, and the slot
//! payload kept in the cache.

pub mod requests;
pub mod responses;
pub mod slot;

// Re-export commonly used types
pub use requests::PrefetchRequest;
pub use responses::{
    BuilderInfo, BuildersResponse, CacheEntriesResponse, ErrorResponse, HealthResponse,
    LatestSlotResponse, PrefetchResponse, SlotResponse, StatsResponse,
};
pub use slot::{Bid, SlotBids};
