//! Background Tasks Module
//!
//! Contains the tasks that run alongside the HTTP server.
//!
//! # Tasks
//! - Prefetch workers: Warm the cache for slots likely to be viewed next
//! - Expired slot sweep: Removes expired cache entries at configured intervals

mod cleanup;
mod prefetch;

pub use cleanup::spawn_cleanup_task;
pub use prefetch::{spawn_prefetch_workers, PrefetchScheduler};
