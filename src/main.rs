//! Slot Bids server binary
//!
//! Wires configuration, the Xatu data source, the slot cache and its
//! background tasks into the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slot_bids::{
    create_router, spawn_cleanup_task, spawn_prefetch_workers, AppState, BuilderDirectory,
    Config, SlotCache, SlotFetcher, XatuFetcher,
};

/// Main entry point for the slot bid server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Load the builder mapping and connect the Xatu fetcher
/// 4. Create the slot cache and start the prefetch workers and sweep task
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slot_bids=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting slot bid server");

    let config = Config::from_env();
    config.validate()?;
    info!(
        max_entries = config.max_entries,
        cache_ttl = config.cache_ttl,
        port = config.server_port,
        prefetch_depth = config.prefetch_depth,
        prefetch_workers = config.prefetch_workers,
        network = %config.network,
        "Configuration loaded"
    );

    let builders = Arc::new(BuilderDirectory::load(&config.builder_mapping));
    let fetcher: Arc<dyn SlotFetcher> = Arc::new(
        XatuFetcher::new(&config, Arc::clone(&builders)).context("building Xatu client")?,
    );

    let cache = SlotCache::from_config(&config)?;
    let (scheduler, prefetch_handle) =
        spawn_prefetch_workers(cache.clone(), Arc::clone(&fetcher), &config);
    let cleanup_handle =
        spawn_cleanup_task(cache.clone(), Duration::from_secs(config.cleanup_interval));

    let state = AppState::new(cache, scheduler, fetcher, builders, &config);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(vec![prefetch_handle, cleanup_handle]))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the
/// background tasks. Prefetches still in flight are abandoned.
async fn shutdown_signal(background: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for handle in background {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
