//! Query embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Turns a standalone question into a query vector
///
/// Implementations:
/// - `GeminiEmbedder`: Gemini `embedContent` (text-embedding-004)
/// - `HashEmbedder`: deterministic in-process double for tests
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one query; the vector must match the index dimensionality
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Vector length this provider produces
    fn dimensions(&self) -> usize;

    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logs and `/info`
    fn name(&self) -> &str;
}
