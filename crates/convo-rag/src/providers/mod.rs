//! Provider abstractions for the external collaborators
//!
//! The chat pipeline only talks to these traits, so the managed services
//! (Gemini for generation and embeddings, Pinecone for similarity search)
//! can be swapped for in-process doubles.

pub mod embedding;
pub mod google;
pub mod llm;
pub mod mock;
pub mod pinecone;
pub mod retry;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use retry::RetryPolicy;
pub use vector_store::{VectorMatch, VectorStoreProvider};

use crate::error::{Error, Result};

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Turn a non-success response into `Error::Upstream`
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }

    Err(Error::Upstream {
        service,
        status: status.as_u16(),
        body,
    })
}

/// Build the shared HTTP client used by a provider
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}
