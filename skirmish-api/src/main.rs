use anyhow::{Context, Result};
use skirmish_core::config::Config;
use skirmish_core::core_match::MatchEngine;
use skirmish_core::core_roster::RosterBroadcaster;
use skirmish_core::core_store::SqlStore;
use skirmish_core::logging::{init_logging_with_config, LogConfig};
use skirmish_core::shutdown::{install_signal_handlers, ShutdownCoordinator};
use std::sync::Arc;
use tracing::info;

mod auth;
mod error;
mod handlers;
mod routes;
mod session;
mod sockets;

use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Config file path via SKIRMISH_CONFIG; environment overrides on top
    let config = match std::env::var("SKIRMISH_CONFIG") {
        Ok(path) => Config::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        Err(_) => Config::from_env().context("failed to load config from environment")?,
    };
    config.validate().context("invalid configuration")?;

    init_logging_with_config(LogConfig::from(&config.logging))
        .context("failed to initialize logging")?;

    info!(bind = %config.server.bind_address, db = %config.store.db_path.display(), "skirmish API server starting");

    let store = SqlStore::open(
        &config.store.db_path,
        config.store.connection_timeout,
        config.store.busy_timeout,
    )
    .context("failed to open membership store")?;

    let engine = Arc::new(MatchEngine::new(store, config.matches.clone()));
    let broadcaster = Arc::new(RosterBroadcaster::new(config.roster.clone()));

    let shutdown = Arc::new(ShutdownCoordinator::new(config.server.shutdown_timeout));
    install_signal_handlers(shutdown.clone());
    tokio::spawn(broadcaster.clone().run_eviction(shutdown.clone()));

    let state = AppState {
        engine,
        broadcaster,
        auth: Arc::new(auth::AuthManager::new()),
        sessions: Arc::new(session::SessionManager::new()),
    };
    let app = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;
    info!(addr = %listener.local_addr()?, "listening");

    let shutdown_for_server = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_for_server.wait_for_shutdown().await;
            info!("draining connections");
        })
        .await
        .context("server error")?;

    info!("skirmish API server stopped");
    Ok(())
}
