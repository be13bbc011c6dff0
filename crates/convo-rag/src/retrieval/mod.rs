//! Retrieval of supporting chunks from the vector index

pub mod search;

pub use search::{RetrievedChunk, Retriever};
