//! # BarkasBali88 Storefront Entry Point
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Load Configuration ────► defaults < config.toml < BARKAS_* env     │
//! │  2. Initialize Logging ────► tracing-subscriber with EnvFilter         │
//! │  3. Connect to Database ───► SQLite, WAL mode, pending migrations      │
//! │  4. Build State ───────────► DbState, per-visitor carts and sign-ins   │
//! │  5. Subscribe Observers ───► cart / session changes logged at debug    │
//! │  6. Serve ─────────────────► until Ctrl-C or SIGTERM                   │
//! │  7. Close Pool                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use barkas_db::{Database, DbConfig};
use barkas_storefront::config::AppConfig;
use barkas_storefront::state::AppState;
use barkas_storefront::{build_router, subscribe_logging};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing();
    info!(store = %config.store.name, "Starting BarkasBali88 storefront");

    if config.uses_dev_secret() {
        warn!("Using the built-in JWT secret; set BARKAS_JWT_SECRET in production");
    }

    if let Some(dir) = config.database.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }

    let db_config = DbConfig::new(config.database.path.clone())
        .max_connections(config.database.max_connections);
    let db = Database::new(db_config)
        .await
        .context("Failed to open database")?;
    info!(path = %config.database.path.display(), "Database connected and migrations applied");

    let addr = config.bind_address();
    let state = AppState::new(db.clone(), config);
    let _subscriptions = subscribe_logging(&state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!(%addr, "Storefront listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=barkas=trace` - Show trace for barkas crates only
/// - Default: `info,barkas=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,barkas=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Waits for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
