//! MRMS Proxy - A caching reverse proxy for a map image export service
//!
//! Sanitizes export queries, forwards them to a single fixed upstream and
//! caches images and time-step lists with TTL expiration and LRU eviction.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mrms_proxy::api::{create_router, API_MOUNT};
use mrms_proxy::{spawn_cleanup_task, AppState, Config};

/// Main entry point for the proxy server.
///
/// # Startup Sequence
/// 1. Load `.env` if present
/// 2. Initialize tracing subscriber for logging
/// 3. Load configuration from environment variables
/// 4. Create the proxy with its cache and upstream client
/// 5. Start background TTL cleanup task
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mrms_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MRMS proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, image_ttl={}ms, times_ttl={}ms, port={}, cleanup_interval={}s",
        config.max_entries,
        config.default_ttl_ms,
        config.times_ttl_ms,
        config.server_port,
        config.cleanup_interval
    );
    if config.upstream_export_base.is_none() {
        warn!("UPSTREAM_EXPORT_BASE not configured; export requests will fail until it is set");
    }

    let state = AppState::from_config(&config).context("failed to build upstream client")?;
    info!("Cache store initialized");

    let cleanup_handle = spawn_cleanup_task(state.cache(), config.cleanup_interval);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Proxy listening on http://{} (API under {})", addr, API_MOUNT);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the cleanup task.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
