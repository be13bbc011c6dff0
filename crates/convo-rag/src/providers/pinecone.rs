//! Pinecone vector index provider
//!
//! Queries go to the index's data-plane host. When only the index name is
//! configured the host is looked up once through the control plane and
//! cached for the lifetime of the provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::providers::vector_store::{VectorMatch, VectorStoreProvider};
use crate::providers::{ensure_success, http_client, RetryPolicy};

const SERVICE: &str = "pinecone";

/// Pinecone index client
pub struct PineconeIndex {
    http: reqwest::Client,
    api_key: String,
    api_version: String,
    index_name: Option<String>,
    namespace: Option<String>,
    control_plane_url: String,
    /// Resolved data-plane base URL
    host: RwLock<Option<String>>,
    retry: RetryPolicy,
}

impl PineconeIndex {
    /// Create a new index client
    pub fn new(config: &VectorDbConfig, retry: RetryPolicy) -> Result<Self> {
        if config.index_host.is_none() && config.index_name.is_none() {
            return Err(Error::Config(
                "Pinecone index_host or index_name is required".to_string(),
            ));
        }

        Ok(Self {
            http: http_client()?,
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            index_name: config.index_name.clone(),
            namespace: config.namespace.clone(),
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
            host: RwLock::new(config.index_host.as_deref().map(normalize_host)),
            retry,
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    /// Data-plane base URL, resolving it through the control plane if needed
    async fn host(&self) -> Result<String> {
        {
            let host = self.host.read().await;
            if let Some(ref cached) = *host {
                return Ok(cached.clone());
            }
        }

        let mut host = self.host.write().await;
        // Another request may have resolved it while we waited for the lock
        if let Some(ref cached) = *host {
            return Ok(cached.clone());
        }

        let resolved = self.describe_index().await?;
        tracing::info!("Resolved Pinecone index host: {}", resolved);
        *host = Some(resolved.clone());
        Ok(resolved)
    }

    async fn describe_index(&self) -> Result<String> {
        let name = self
            .index_name
            .as_deref()
            .ok_or_else(|| Error::Config("Pinecone index_name is not set".to_string()))?;
        let url = format!("{}/indexes/{}", self.control_plane_url, name);

        let url = url.as_str();
        let description: IndexDescription = self
            .retry
            .run(SERVICE, move || async move {
                let response = self.authorized(self.http.get(url)).send().await?;
                let response = ensure_success(SERVICE, response).await?;
                response.json().await.map_err(|e| {
                    Error::vector_db(format!("Failed to parse index description: {}", e))
                })
            })
            .await?;

        Ok(normalize_host(&description.host))
    }
}

/// Prefix bare hosts with https and drop trailing slashes
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

#[async_trait]
impl VectorStoreProvider for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        let url = format!("{}/query", self.host().await?);
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let url = url.as_str();
        let request = &request;
        let response: QueryResponse = self
            .retry
            .run(SERVICE, move || async move {
                let response = self
                    .authorized(self.http.post(url))
                    .json(request)
                    .send()
                    .await?;
                let response = ensure_success(SERVICE, response).await?;
                response
                    .json()
                    .await
                    .map_err(|e| Error::vector_db(format!("Failed to parse query response: {}", e)))
            })
            .await?;

        tracing::debug!("Pinecone returned {} matches", response.matches.len());
        Ok(response.matches)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/describe_index_stats", self.host().await?);
        let response = self
            .authorized(self.http.get(url))
            .timeout(self.retry.request_timeout)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
