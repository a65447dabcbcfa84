//! API Handlers
//!
//! HTTP request handlers for each slot bid endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::cache::{Slot, SlotCache};
use crate::config::Config;
use crate::error::{AppError, FetchError, Result};
use crate::fetch::SlotFetcher;
use crate::labels::BuilderDirectory;
use crate::models::{
    BuildersResponse, CacheEntriesResponse, HealthResponse, LatestSlotResponse, PrefetchRequest,
    PrefetchResponse, SlotBids, SlotResponse, StatsResponse,
};
use crate::tasks::PrefetchScheduler;

/// Application state shared across all handlers.
///
/// Every field is a cheap handle; cloning the state per request shares the
/// same cache, queue and data source.
#[derive(Clone)]
pub struct AppState {
    pub cache: SlotCache<Arc<SlotBids>>,
    pub scheduler: PrefetchScheduler,
    pub fetcher: Arc<dyn SlotFetcher>,
    pub builders: Arc<BuilderDirectory>,
    /// Slots kept behind the chain head
    pub head_offset: u64,
    /// Directory holding the dashboard's index.html and assets
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        cache: SlotCache<Arc<SlotBids>>,
        scheduler: PrefetchScheduler,
        fetcher: Arc<dyn SlotFetcher>,
        builders: Arc<BuilderDirectory>,
        config: &Config,
    ) -> Self {
        Self {
            cache,
            scheduler,
            fetcher,
            builders,
            head_offset: config.head_offset,
            static_dir: config.static_dir.clone(),
        }
    }
}

/// Handler for GET /api/slot/:slot
///
/// Serves the slot from the cache or fetches it, then queues prefetches of
/// the following slots. Nothing is queued when the fetch fails.
pub async fn slot_handler(
    State(state): State<AppState>,
    Path(slot): Path<Slot>,
) -> Result<Json<SlotResponse>> {
    let fetcher = Arc::clone(&state.fetcher);
    let lookup = state
        .cache
        .lookup_or_fetch(slot, move |slot| async move {
            fetcher.fetch_slot(slot).await.map(Arc::new)
        })
        .await
        .map_err(|error| {
            warn!(slot, %error, "Slot fetch failed");
            AppError::from(error)
        })?;

    state.scheduler.schedule_following(slot);

    Ok(Json(SlotResponse::new(lookup.value, lookup.cached)))
}

/// Handler for GET /api/latest-slot
///
/// Reports the newest slot whose data is expected to be complete: the chain
/// head as seen by the data source minus the configured offset.
pub async fn latest_slot_handler(State(state): State<AppState>) -> Result<Json<LatestSlotResponse>> {
    let head = state.fetcher.latest_slot().await?;
    let slot = head.checked_sub(state.head_offset).ok_or_else(|| {
        FetchError::Empty(format!(
            "chain head {} is within the head offset {}",
            head, state.head_offset
        ))
    })?;

    Ok(Json(LatestSlotResponse {
        slot,
        head_offset: state.head_offset,
    }))
}

/// Handler for POST /api/prefetch
///
/// Queues each listed slot for background prefetch and returns immediately.
pub async fn prefetch_handler(
    State(state): State<AppState>,
    Json(req): Json<PrefetchRequest>,
) -> Result<Json<PrefetchResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let queued = req
        .slots
        .iter()
        .filter(|slot| state.scheduler.schedule(**slot))
        .count();

    Ok(Json(PrefetchResponse::new(req.slots, queued)))
}

/// Handler for GET /api/builders
pub async fn builders_handler(State(state): State<AppState>) -> Json<BuildersResponse> {
    Json(BuildersResponse {
        builders: state.builders.builders(),
    })
}

/// Handler for GET /api/cache
///
/// Lists live cache entries with their age and remaining lifetime.
pub async fn cache_handler(State(state): State<AppState>) -> Json<CacheEntriesResponse> {
    Json(CacheEntriesResponse {
        capacity: state.cache.capacity(),
        ttl_secs: state.cache.ttl().as_secs(),
        entries: state.cache.entries(),
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /
///
/// Serves the dashboard page if one is installed, otherwise a short API
/// description.
pub async fn index_handler(State(state): State<AppState>) -> Response {
    match tokio::fs::read_to_string(state.static_dir.join("index.html")).await {
        Ok(page) => Html(page).into_response(),
        Err(_) => Json(json!({
            "message": "MEV Builder Bids Dashboard API",
            "endpoints": [
                "/api/latest-slot",
                "/api/slot/:slot",
                "/api/prefetch",
                "/api/builders",
                "/api/cache",
            ],
        }))
        .into_response(),
    }
}
