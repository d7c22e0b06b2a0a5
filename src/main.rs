//! vfs_server - A virtual filesystem served over HTTP

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vfs_server::{create_router, spawn_sweep_task, AppState, Config, SweepHandle};

/// Main entry point for the virtual filesystem server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create cache, worker pool and path resolver
/// 4. Start background cache expiry sweep
/// 5. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vfs_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting virtual filesystem server");

    let config = Config::from_env();
    if !config.storage_dir.is_dir() {
        anyhow::bail!(
            "storage directory {} does not exist",
            config.storage_dir.display()
        );
    }
    info!(
        storage = %config.storage_dir.display(),
        mounts = config.mount_dirs.len(),
        specifics = config.specific_dirs.len(),
        port = config.server_port,
        "Configuration loaded"
    );

    let sweep_interval = config.sweep_interval;
    let port = config.server_port;
    let state = AppState::from_config(config);

    let sweep = spawn_sweep_task(state.cache.clone(), sweep_interval);
    info!(interval_secs = sweep_interval.as_secs(), "Cache sweep task started");

    let pool = state.pool.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep))
        .await
        .context("server error")?;

    tokio::task::spawn_blocking(move || pool.close())
        .await
        .context("worker pool shutdown")?;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then stops the sweep task.
async fn shutdown_signal(sweep: SweepHandle) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
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

    sweep.stop();
    info!("Cache sweep task stopped");
}
