//! Hotspot session control server.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use hotspot_core::config::AppConfig;
use hotspot_core::error::AppError;
use hotspot_database::{DatabasePool, RadacctRepository};
use hotspot_session::{MemorySessionStore, SessionStore};

#[tokio::main]
async fn main() {
    let env = std::env::var("HOTSPOT_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting hotspot-server v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Session store ────────────────────────────────────
    let database = match &config.database {
        Some(db_config) => {
            tracing::info!("Connecting to accounting database...");
            Some(DatabasePool::connect(db_config).await?)
        }
        None => {
            tracing::warn!("No database configured; terminations will not be persisted");
            None
        }
    };
    let store: Arc<dyn SessionStore> = match &database {
        Some(db) => Arc::new(RadacctRepository::new(db.pool().clone())),
        None => Arc::new(MemorySessionStore::new()),
    };

    // ── Step 2: Shutdown signal ──────────────────────────────────
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        trigger.cancel();
    });

    // ── Step 3: Serve until shutdown ─────────────────────────────
    let result = hotspot_api::run_server(config, store, shutdown).await;

    // ── Step 4: Close the database ───────────────────────────────
    if let Some(db) = database {
        db.close().await;
    }

    tracing::info!("hotspot-server shut down");
    result
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
