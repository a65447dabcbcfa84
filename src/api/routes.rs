//! API Routes
//!
//! Configures the Axum router with all slot bid endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers::{
    builders_handler, cache_handler, health_handler, index_handler, latest_slot_handler,
    prefetch_handler, slot_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/latest-slot` - Newest slot with complete data
/// - `GET /api/slot/:slot` - Bids for a slot
/// - `POST /api/prefetch` - Queue slots for background prefetch
/// - `GET /api/builders` - Known builders and their colors
/// - `GET /api/cache` - Cached slots with age and remaining TTL
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
/// - `GET /` and `/static/*` - Dashboard page and assets
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/latest-slot", get(latest_slot_handler))
        .route("/api/slot/:slot", get(slot_handler))
        .route("/api/prefetch", post(prefetch_handler))
        .route("/api/builders", get(builders_handler))
        .route("/api/cache", get(cache_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .nest_service("/static", assets)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
