//! HTTP surface: routes, request validation and response shaping.

mod error;
mod handlers;
mod request;

pub use error::{ApiError, ErrorBody};
pub use handlers::{HealthResponse, IdentifyResponse, check_confidence};
pub use request::{IdentifyRequest, REQUIRED_FIELDS, parse_identify_request};

use crate::constants::server::{HEALTH_PATH, IDENTIFY_PATH, MAX_BODY_BYTES};
use crate::error::{Error, Result};
use crate::pipeline::IdentificationPipeline;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// State shared by all requests.
pub struct AppState {
    /// Loaded models and taxonomy client.
    pub pipeline: IdentificationPipeline,
}

impl AppState {
    /// Wrap a pipeline for sharing across handlers.
    pub fn new(pipeline: IdentificationPipeline) -> Arc<Self> {
        Arc::new(Self { pipeline })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(IDENTIFY_PATH, post(handlers::identify))
        .route(HEALTH_PATH, get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Bind `host:port` and serve until Ctrl+C.
pub async fn serve(host: &str, port: u16, state: Arc<AppState>) -> Result<()> {
    let address = format!("{host}:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| Error::ServerBind {
            address: address.clone(),
            source,
        })?;

    info!("Listening on http://{address}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested, finishing in-flight requests"),
        Err(e) => {
            warn!("Failed to listen for Ctrl+C, graceful shutdown disabled: {e}");
            std::future::pending::<()>().await;
        }
    }
}
