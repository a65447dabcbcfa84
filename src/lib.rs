//! Slot Bids - block-auction viewer backend
//!
//! Serves per-slot builder bids from an analytical data store through a
//! bounded TTL/LRU cache, with deduplicated background prefetch of the slots
//! a viewer is likely to open next.

pub mod api;
pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod fetch;
pub mod labels;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::SlotCache;
pub use config::Config;
pub use fetch::{SlotFetcher, XatuFetcher};
pub use labels::BuilderDirectory;
pub use tasks::{spawn_cleanup_task, spawn_prefetch_workers, PrefetchScheduler};
