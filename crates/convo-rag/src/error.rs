//! Error types for the chat backend

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;

use crate::types::response::ErrorResponse;

/// Result type alias for chat backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned to callers for any failure that is not theirs to fix
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Message returned to callers when a collaborator stayed unreachable
pub const UPSTREAM_UNAVAILABLE: &str = "Upstream service unavailable";

/// Chat backend errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid client input (missing question, malformed body)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding collaborator error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index collaborator error
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// Language model collaborator error
    #[error("LLM error: {0}")]
    Llm(String),

    /// A collaborator answered with a non-success HTTP status
    #[error("{service} returned HTTP {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// A single collaborator call exceeded its deadline
    #[error("{service} did not respond within {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },

    /// A collaborator kept failing transiently until retries ran out
    #[error("{service} unavailable after {attempts} attempts: {last_error}")]
    UpstreamUnavailable {
        service: &'static str,
        attempts: u32,
        last_error: String,
    },

    /// Unknown conversation session
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether retrying the same call may succeed
    ///
    /// Timeouts, connection failures, throttling (429) and server-side
    /// failures (5xx) are transient. Everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Upstream { status, .. } => *status == 429 || *status >= 500,
            Error::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Error::Timeout { .. } | Error::UpstreamUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller
    ///
    /// Only validation and lookup failures carry their own text; every
    /// collaborator or internal failure collapses to a fixed sentence.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::SessionNotFound(_) => "Session not found".to_string(),
            Error::Timeout { .. } | Error::UpstreamUnavailable { .. } => {
                UPSTREAM_UNAVAILABLE.to_string()
            }
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = Json(ErrorResponse::new(self.public_message()));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_errors_are_generic() {
        let err = Error::llm("quota exceeded for key AIza-secret");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), GENERIC_FAILURE);
        assert!(!err.public_message().contains("AIza"));
    }

    #[test]
    fn test_validation_keeps_message() {
        let err = Error::validation("Question is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Question is required");
    }

    #[test]
    fn test_transient_classification() {
        let throttled = Error::Upstream {
            service: "gemini",
            status: 429,
            body: String::new(),
        };
        let bad_request = Error::Upstream {
            service: "gemini",
            status: 400,
            body: String::new(),
        };
        let timeout = Error::Timeout {
            service: "pinecone",
            after: Duration::from_secs(1),
        };

        assert!(throttled.is_transient());
        assert!(!bad_request.is_transient());
        assert!(timeout.is_transient());
        assert!(!Error::llm("no candidates").is_transient());
    }

    #[test]
    fn test_unavailable_maps_to_503() {
        let err = Error::UpstreamUnavailable {
            service: "gemini-embeddings",
            attempts: 3,
            last_error: "connection refused".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.public_message(), UPSTREAM_UNAVAILABLE);
    }
}
