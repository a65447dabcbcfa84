//! Slot data sources
//!
//! The cache treats loading a slot as an opaque async operation. This module
//! defines that seam and the production implementation backed by Xatu.

pub mod queries;
pub mod xatu;

use async_trait::async_trait;

use crate::cache::Slot;
use crate::error::FetchError;
use crate::models::SlotBids;

pub use xatu::XatuFetcher;

/// Loads auction data for slots.
#[async_trait]
pub trait SlotFetcher: Send + Sync {
    /// All bids, relays and the winning block for `slot`.
    async fn fetch_slot(&self, slot: Slot) -> Result<SlotBids, FetchError>;

    /// Highest slot the data source has bids for.
    async fn latest_slot(&self) -> Result<Slot, FetchError>;
}
