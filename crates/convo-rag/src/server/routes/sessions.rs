//! Session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::SessionHistoryResponse;

/// GET /sessions/:id - Conversation so far
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionHistoryResponse>> {
    let turns = state
        .sessions()
        .history(&id)
        .await
        .ok_or_else(|| Error::SessionNotFound(id.clone()))?;

    Ok(Json(SessionHistoryResponse {
        session_id: id,
        turns,
    }))
}

/// DELETE /sessions/:id - Forget a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.sessions().remove(&id) {
        tracing::info!("Deleted session {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::SessionNotFound(id))
    }
}
