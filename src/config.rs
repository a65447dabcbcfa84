//! Configuration Module
//!
//! Handles loading and validating server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::chain::Network;
use crate::error::{AppError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of slots the cache can hold
    pub max_entries: usize,
    /// Lifetime of a cached slot in seconds
    pub cache_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Number of following slots prefetched after each request
    pub prefetch_depth: u64,
    /// Maximum concurrent background prefetches
    pub prefetch_workers: usize,
    /// Maximum queued prefetch jobs before new ones are dropped
    pub prefetch_queue: usize,
    /// Slots kept behind the chain head so their data is complete
    pub head_offset: u64,
    /// Xatu ClickHouse HTTP endpoint
    pub xatu_url: String,
    pub xatu_username: Option<String>,
    pub xatu_password: Option<String>,
    /// Per-query timeout in seconds
    pub fetch_timeout: u64,
    /// Network name: mainnet, sepolia, holesky or hoodi
    pub network: String,
    /// CSV file mapping builder pubkeys to names
    pub builder_mapping: PathBuf,
    /// Directory served under /static
    pub static_dir: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cached slots (default: 100)
    /// - `CACHE_TTL` - Slot TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `CLEANUP_INTERVAL` - Expired entry sweep in seconds (default: 30)
    /// - `PREFETCH_DEPTH` - Slots warmed after each request (default: 3)
    /// - `PREFETCH_WORKERS` - Concurrent prefetches (default: 4)
    /// - `PREFETCH_QUEUE` - Queued prefetch jobs (default: 64)
    /// - `HEAD_OFFSET` - Distance kept from the chain head (default: 100)
    /// - `XATU_URL`, `XATU_USERNAME`, `XATU_PASSWORD` - Data source access
    /// - `FETCH_TIMEOUT` - Query timeout in seconds (default: 30)
    /// - `NETWORK` - mainnet, sepolia, holesky or hoodi (default: mainnet)
    /// - `BUILDER_MAPPING` - Builder label CSV (default: builder_mapping.csv)
    /// - `STATIC_DIR` - Static files directory (default: static)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_env("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            cache_ttl: parse_env("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_env("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            prefetch_depth: parse_env("PREFETCH_DEPTH").unwrap_or(defaults.prefetch_depth),
            prefetch_workers: parse_env("PREFETCH_WORKERS").unwrap_or(defaults.prefetch_workers),
            prefetch_queue: parse_env("PREFETCH_QUEUE").unwrap_or(defaults.prefetch_queue),
            head_offset: parse_env("HEAD_OFFSET").unwrap_or(defaults.head_offset),
            xatu_url: env::var("XATU_URL").unwrap_or(defaults.xatu_url),
            xatu_username: env::var("XATU_USERNAME").ok(),
            xatu_password: env::var("XATU_PASSWORD").ok(),
            fetch_timeout: parse_env("FETCH_TIMEOUT").unwrap_or(defaults.fetch_timeout),
            network: env::var("NETWORK").unwrap_or(defaults.network),
            builder_mapping: env::var("BUILDER_MAPPING")
                .map(PathBuf::from)
                .unwrap_or(defaults.builder_mapping),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        }
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(AppError::InvalidConfig(
                "MAX_ENTRIES must be at least 1".to_string(),
            ));
        }
        if self.prefetch_workers == 0 || self.prefetch_queue == 0 {
            return Err(AppError::InvalidConfig(
                "PREFETCH_WORKERS and PREFETCH_QUEUE must be at least 1".to_string(),
            ));
        }
        if self.cleanup_interval == 0 {
            return Err(AppError::InvalidConfig(
                "CLEANUP_INTERVAL must be at least 1 second".to_string(),
            ));
        }
        self.network()?;
        Ok(())
    }

    /// The configured network; only networks with a known genesis are accepted.
    pub fn network(&self) -> Result<Network> {
        self.network.parse()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            cache_ttl: 300,
            server_port: 8000,
            cleanup_interval: 30,
            prefetch_depth: 3,
            prefetch_workers: 4,
            prefetch_queue: 64,
            head_offset: 100,
            xatu_url: "http://localhost:8123".to_string(),
            xatu_username: None,
            xatu_password: None,
            fetch_timeout: 30,
            network: "mainnet".to_string(),
            builder_mapping: PathBuf::from("builder_mapping.csv"),
            static_dir: PathBuf::from("static"),
        }
    }
}
