//! Response types

use serde::{Deserialize, Serialize};

use super::conversation::Turn;

/// Successful answer from `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Answer grounded in the retrieved context (or the fallback sentence)
    pub answer: String,
    /// Session the exchange was recorded under
    pub session_id: String,
}

/// Error body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of `GET /sessions/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}
