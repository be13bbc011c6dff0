//! Question endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

/// POST /ask - Answer a question within a session
pub async fn ask(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>> {
    let Json(request) = payload.map_err(|e| Error::validation(e.body_text()))?;
    let question = request.validated_question()?;

    let reply = state.pipeline().ask(request.session(), question).await?;

    Ok(Json(AskResponse {
        answer: reply.answer,
        session_id: reply.session_id,
    }))
}
