//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, Router};
use serde_json::Value;

use slot_bids::cache::Slot;
use slot_bids::error::FetchError;
use slot_bids::models::{Bid, SlotBids};
use slot_bids::{
    create_router, spawn_prefetch_workers, AppState, BuilderDirectory, Config, SlotCache,
    SlotFetcher,
};

/// In-memory data source. Slots listed in `failing` return an error.
#[derive(Default)]
pub struct StubFetcher {
    pub calls: AtomicUsize,
    pub failing: Vec<Slot>,
    pub head: Slot,
    pub delay: Duration,
}

impl StubFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlotFetcher for StubFetcher {
    async fn fetch_slot(&self, slot: Slot) -> Result<SlotBids, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(&slot) {
            return Err(FetchError::Status {
                status: 503,
                body: "too many simultaneous queries".to_string(),
            });
        }

        Ok(SlotBids {
            slot,
            bids: vec![Bid {
                timestamp_ms: 1_700_000_000_000,
                seconds_in_slot: 1.25,
                value_eth: 0.042,
                builder_pubkey: "0xaaa".to_string(),
                builder_label: "Titan".to_string(),
                block_hash: format!("0x{:x}", slot),
                color: "#38bdf8".to_string(),
                is_winner: true,
            }],
            relays: vec!["flashbots".to_string(), "ultrasound".to_string()],
            winning_block_hash: Some(format!("0x{:x}", slot)),
        })
    }

    async fn latest_slot(&self) -> Result<Slot, FetchError> {
        Ok(self.head)
    }
}

pub fn test_config() -> Config {
    Config {
        static_dir: PathBuf::from("/nonexistent/static"),
        ..Config::default()
    }
}

/// Router plus the handles tests inspect.
pub struct TestApp {
    pub router: Router,
    pub cache: SlotCache<Arc<SlotBids>>,
    pub fetcher: Arc<StubFetcher>,
}

pub fn create_test_app(fetcher: StubFetcher, config: Config) -> TestApp {
    let fetcher = Arc::new(fetcher);
    let cache = SlotCache::from_config(&config).unwrap();
    let (scheduler, _handle) = spawn_prefetch_workers(cache.clone(), fetcher.clone(), &config);
    let builders = Arc::new(BuilderDirectory::new(vec![
        ("0xaaa".to_string(), "Titan".to_string()),
        ("0xbbb".to_string(), "Beaver".to_string()),
    ]));
    let state = AppState::new(cache.clone(), scheduler, fetcher.clone(), builders, &config);

    TestApp {
        router: create_router(state),
        cache,
        fetcher,
    }
}

pub async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Polls `condition` until it holds, failing the test after about two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
