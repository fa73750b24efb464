//! HTTP server initialization and routing

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::face_api::{analyze, detect, find, represent, verify};
use crate::shared::state::AppState;

use super::{health_check, shutdown_signal};

/// Build the application router. Split out of [`run_axum_server`] so tests
/// can serve the exact production route table on an ephemeral port.
pub fn build_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.max_body_mb as usize * 1024 * 1024;

    Router::new()
        .route("/health", get(health_check))
        .route("/detect", post(detect))
        .route("/analyze", post(analyze))
        .route("/represent", post(represent))
        .route("/verify", post(verify))
        .route("/find", post(find))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_axum_server(state: Arc<AppState>) -> std::io::Result<()> {
    let ip: IpAddr = state.config.bind.parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid bind address {}: {}", state.config.bind, e),
        )
    })?;
    let addr = SocketAddr::new(ip, state.config.port);

    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}
