//! vibes_server: HTTP host for the LLM Vibes Radar core.
//!
//! Startup order:
//! 1. Load `.env` if present, then install the logger.
//! 2. Read configuration from the environment.
//! 3. Build adapters, the fan-out coordinator and the chat store.
//! 4. Serve the router until SIGINT or SIGTERM.

mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::new()
        .parse_filters(&config::log_filter())
        .init();

    log::info!("vibes_server {} starting", env!("CARGO_PKG_VERSION"));

    let cfg = Config::from_env().context("failed to read configuration")?;
    let addr = cfg.bind_address;
    log::info!(
        "fan-out roster: {:?}, live: {:?}",
        cfg.runtime.fanout_models,
        cfg.runtime.live_models
    );

    let state = Arc::new(AppState::from_config(cfg).context("failed to build application state")?);
    let app = routes::build(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("HTTP server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("vibes_server stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install CTRL+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => log::warn!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    log::info!("shutdown signal received; draining connections");
}
