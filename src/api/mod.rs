//! API Module
//!
//! HTTP handlers and routing for the slot bid REST API.
//!
//! # Endpoints
//! - `GET /api/latest-slot` - Newest slot with complete data
//! - `GET /api/slot/:slot` - Bids for a slot, served through the cache
//! - `POST /api/prefetch` - Queue slots for background prefetch
//! - `GET /api/builders` - Known builders and their colors
//! - `GET /api/cache` - Cache introspection
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
