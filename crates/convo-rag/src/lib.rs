//! convo-rag: conversational question answering over a vector index
//!
//! Each question is rewritten into a standalone form using the session's
//! conversation so far, embedded, matched against the index, and answered
//! by the language model strictly from the retrieved chunks. The crate
//! ships an axum server exposing `POST /ask` and an optional terminal
//! client behind the `cli` feature.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{ChatPipeline, ChatReply, HealthReport};
pub use server::{create_router, state::AppState, ChatServer};
pub use session::SessionStore;
pub use types::{AskRequest, AskResponse, ConversationLog, ErrorResponse, Role, Turn};
