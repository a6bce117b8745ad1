//! funapps backend: the HTTP server behind the content-listing site.
//!
//! Pages are assembled from a `ContentStore` and returned as a template name
//! plus its JSON context. See `api` for the route table.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod services;

use std::{net::SocketAddr, sync::Arc};

use adapters::ContentStore;
use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;

use config::Config;

/// Shared by every request handler.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ContentStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ContentStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}

pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = state
        .config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind_addr {:?}", state.config.bind_addr))?;
    let app = api::router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install signal handler");
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
