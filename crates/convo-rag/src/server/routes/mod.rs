//! API routes for the chat server

pub mod ask;
pub mod sessions;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_body_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/ask",
            post(ask::ask).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/info", get(info))
}

/// Service description endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let pipeline = state.pipeline();
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Conversational question answering over an indexed document",
        "providers": {
            "llm": pipeline.llm().name(),
            "embeddings": pipeline.embedder().name(),
            "vector_store": pipeline.vector_store().name(),
        },
        "models": {
            "llm": pipeline.llm().model(),
            "embeddings": state.config().embeddings.model,
            "embedding_dimensions": pipeline.embedder().dimensions(),
        },
        "retrieval": {
            "top_k": state.config().retrieval.top_k,
        },
        "active_sessions": state.sessions().len(),
        "endpoints": {
            "POST /ask": "Ask a question, optionally within a session",
            "GET /sessions/:id": "Conversation history of a session",
            "DELETE /sessions/:id": "Forget a session",
            "GET /health": "Liveness",
            "GET /ready": "Collaborator health"
        }
    }))
}
