//! HTTP surface of the service
//!
//! Routes:
//! - `GET /rickandmorty` - the projected character dataset
//! - `GET /healthcheck` - liveness probe
//! - `GET /` - informational text

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::cache::FileCacheStore;
use crate::cli::ServiceConfig;
use crate::data::UpstreamClient;
use crate::service::{DatasetService, ServiceError};

/// Text served at the root path
pub const WELCOME_TEXT: &str = "Welcome to the Rick and Morty API Service!";

/// Errors that prevent the server from starting or keep it from serving
#[derive(Debug, Error)]
pub enum ServerError {
    /// The upstream HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Binding the listen address failed
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop terminated with an error
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// State shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<DatasetService>,
}

impl AppState {
    pub fn new(service: DatasetService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Builds the router with all public routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/rickandmorty", get(handle_dataset))
        .route("/healthcheck", get(handle_healthcheck))
        .route("/", get(handle_home))
        .with_state(state)
}

/// Assembles the service from configuration
pub fn build_service(config: &ServiceConfig) -> Result<DatasetService, ServerError> {
    let mut http_client = reqwest::Client::builder();
    if let Some(timeout) = config.upstream_timeout {
        http_client = http_client.timeout(timeout);
    }

    let client = UpstreamClient::with_base_url(config.base_url.as_str())
        .with_client(http_client.build()?)
        .with_max_pages(config.max_pages);

    let store = match &config.cache_dir {
        Some(dir) => FileCacheStore::with_dir(dir),
        None => FileCacheStore::new(),
    };
    info!(blob = %store.blob_path().display(), "Using cache blob");

    Ok(DatasetService::new(client, Arc::new(store))
        .with_endpoint(config.endpoint.clone())
        .with_policy(config.policy))
}

/// Runs the server until Ctrl-C
pub async fn run(config: ServiceConfig) -> Result<(), ServerError> {
    let service = build_service(&config)?;
    let app = build_router(AppState::new(service));

    let (listener, local) = bind_listener(&format!("{}:{}", config.host, config.port)).await?;
    info!(%local, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

/// Binds `addr` and resolves the address actually listened on
///
/// Both steps report failures as `ServerError::Bind` for `addr`.
pub async fn bind_listener(
    addr: &str,
) -> Result<(tokio::net::TcpListener, SocketAddr), ServerError> {
    let bind_error = |source: std::io::Error| ServerError::Bind {
        addr: addr.to_string(),
        source,
    };
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(bind_error)?;
    let local = listener.local_addr().map_err(bind_error)?;
    Ok((listener, local))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn handle_dataset(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.dataset().await {
        Ok(served) => (StatusCode::OK, Json(served.dataset)).into_response(),
        Err(ServiceError::Upstream(e)) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn handle_healthcheck() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

async fn handle_home() -> &'static str {
    WELCOME_TEXT
}
