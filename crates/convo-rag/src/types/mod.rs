//! Core types for the chat backend

pub mod conversation;
pub mod query;
pub mod response;

pub use conversation::{ConversationLog, Role, Turn};
pub use query::AskRequest;
pub use response::{AskResponse, ErrorResponse, SessionHistoryResponse};
