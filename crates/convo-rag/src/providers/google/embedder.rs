//! Gemini embedding provider using text-embedding-004
//!
//! Queries are embedded with the `RETRIEVAL_QUERY` task type so they line
//! up with documents indexed as `RETRIEVAL_DOCUMENT`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{model_url, API_KEY_HEADER};
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::providers::embedding::EmbeddingProvider;
use crate::providers::{ensure_success, http_client, RetryPolicy};

const SERVICE: &str = "gemini-embeddings";

/// Gemini embedding provider
pub struct GeminiEmbedder {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

impl GeminiEmbedder {
    /// Create a new embedder
    ///
    /// `api_key` is passed separately so the LLM key can serve as fallback.
    pub fn new(config: &EmbeddingConfig, api_key: &str, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_base: config.api_base.clone(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            retry,
        })
    }

    fn model_path(&self) -> String {
        format!("models/{}", self.model.trim_start_matches("models/"))
    }

    fn check_dimensions(&self, values: &[f32]) {
        if values.len() != self.dimensions {
            tracing::warn!(
                "Embedding model {} returned {} dimensions, expected {}",
                self.model,
                values.len(),
                self.dimensions
            );
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: EmbedContent<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

impl<'a> EmbedContentRequest<'a> {
    fn query(model: &'a str, text: &'a str) -> Self {
        Self {
            model,
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
            task_type: "RETRIEVAL_QUERY",
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.model_path();
        let url = model_url(&self.api_base, &self.model, Some("embedContent"));
        let request = EmbedContentRequest::query(&model, text);

        let url = url.as_str();
        let request = &request;
        let values = self
            .retry
            .run(SERVICE, move || async move {
                let response = self
                    .http
                    .post(url)
                    .header(API_KEY_HEADER, &self.api_key)
                    .json(request)
                    .send()
                    .await?;
                let response = ensure_success(SERVICE, response).await?;

                let parsed: EmbedContentResponse = response.json().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse embedding response: {}", e))
                })?;
                Ok(parsed.embedding.values)
            })
            .await?;

        if values.is_empty() {
            return Err(Error::embedding("Empty embedding in response"));
        }
        self.check_dimensions(&values);
        Ok(values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .http
            .get(model_url(&self.api_base, &self.model, None))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.retry.request_timeout)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_request_shape() {
        let request = EmbedContentRequest::query("models/text-embedding-004", "What is a stack?");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "models/text-embedding-004",
                "content": {"parts": [{"text": "What is a stack?"}]},
                "taskType": "RETRIEVAL_QUERY"
            })
        );
    }

    #[test]
    fn test_parse_embedding() {
        let parsed: EmbedContentResponse =
            serde_json::from_value(json!({"embedding": {"values": [0.25, -0.5, 1.0]}})).unwrap();
        assert_eq!(parsed.embedding.values, vec![0.25, -0.5, 1.0]);
    }

    #[test]
    fn test_model_path_normalized() {
        let config = EmbeddingConfig {
            model: "models/text-embedding-004".to_string(),
            ..EmbeddingConfig::default()
        };
        let embedder = GeminiEmbedder::new(&config, "key", RetryPolicy::default()).unwrap();
        assert_eq!(embedder.model_path(), "models/text-embedding-004");
        assert_eq!(
            model_url(&config.api_base, &config.model, Some("embedContent")),
            "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent"
        );
    }
}
