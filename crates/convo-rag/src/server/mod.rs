//! HTTP server for the chat backend

pub mod routes;
pub mod state;

use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{RagConfig, ServerConfig};
use crate::error::{Error, Result};
use state::AppState;

/// Chat HTTP server
pub struct ChatServer {
    state: AppState,
}

impl ChatServer {
    /// Create a server backed by the configured providers
    pub fn new(config: RagConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::new(config)?,
        })
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        let server = &self.state.config().server;
        format!("{}:{}", server.host, server.port)
    }

    /// Start serving until Ctrl+C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let sweep_interval =
            Duration::from_secs(self.state.config().sessions.sweep_interval_secs.max(1));
        let sweeper = self.state.sessions().clone().spawn_sweeper(sweep_interval);

        let router = create_router(self.state);

        tracing::info!("Starting chat server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        sweeper.abort();
        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Build the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let config = state.config().server.clone();

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .merge(routes::api_routes(config.max_body_size))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    match cors_layer(&config) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    if !config.enable_cors {
        return None;
    }

    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let origin = config
        .cors_origin
        .as_deref()
        .and_then(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        });

    let cors = match origin {
        // Credentials cannot be combined with a wildcard origin
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([axum::http::header::CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    };
    Some(cors)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.pipeline().health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        tracing::warn!("Readiness check failed: {:?}", report);
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
