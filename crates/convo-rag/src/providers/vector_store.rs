//! Vector index provider trait for similarity search

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A single nearest-neighbour match reported by the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Stored vector id
    pub id: String,
    /// Similarity score as reported by the index (higher is closer)
    #[serde(default)]
    pub score: f32,
    /// Metadata stored alongside the vector
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl VectorMatch {
    /// Create a match carrying `text` in its metadata
    pub fn with_text(id: impl Into<String>, score: f32, text: impl Into<String>) -> Self {
        let mut metadata = Map::new();
        metadata.insert("text".to_string(), Value::String(text.into()));
        Self {
            id: id.into(),
            score,
            metadata: Some(metadata),
        }
    }

    /// The chunk text stored under `metadata.text`
    pub fn text(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("text")?.as_str()
    }
}

/// Trait for read-only similarity search
///
/// Implementations:
/// - `PineconeIndex`: Pinecone serverless/pod index
/// - `StaticVectorStore`: fixed matches for tests
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Return up to `top_k` matches for `vector`, best first, with metadata
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
