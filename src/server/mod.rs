//! HTTP invocation surface.
//!
//! A small request-driven entry point over the pipeline: `analyze` runs
//! fleet analysis plus consolidation, `optimize`/`remediate` drive
//! autonomous remediation from a prior analysis, `health` reports
//! liveness. All responses are structured JSON with permissive
//! cross-origin access; unknown routes return a JSON 404.

pub mod handlers;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::host::HostClient;
use crate::models::FleetAnalysis;
use crate::store::StoreClient;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backends: BackendClient,
    pub host: HostClient,
    pub store: StoreClient,
    /// Latest fleet analysis, cached so remediation can reuse it.
    pub latest_analysis: Arc<RwLock<Option<FleetAnalysis>>>,
}

impl AppState {
    /// Build the state from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let backends =
            BackendClient::new(&config.backends).context("Failed to create backend client")?;
        let host = HostClient::new(&config.host).context("Failed to create host client")?;
        let store = StoreClient::new(&config.store);

        Ok(Self {
            config: Arc::new(config),
            backends,
            host,
            store,
            latest_analysis: Arc::new(RwLock::new(None)),
        })
    }
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", get(handlers::analyze).post(handlers::analyze))
        .route("/optimize", post(handlers::optimize))
        .route("/remediate", post(handlers::optimize))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Serve the router until interrupted.
pub async fn serve(state: AppState) -> Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.server.bind, state.config.server.port
    )
    .parse()
    .context("Invalid bind address")?;

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Fleetwarden listening on http://{}", addr);
    info!("  GET/POST /analyze   - run fleet analysis + consolidation");
    info!("  POST     /optimize  - apply remediation opportunities");
    info!("  POST     /remediate - alias of /optimize");
    info!("  GET      /health    - liveness");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
