//! Per-session conversation state

pub mod store;

pub use store::{Session, SessionStore};
