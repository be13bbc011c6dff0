//! Application state for the chat server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::pipeline::ChatPipeline;
use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    pipeline: ChatPipeline,
}

impl AppState {
    /// Create state with the Gemini and Pinecone providers
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing chat application state...");
        let pipeline = ChatPipeline::from_config(&config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create state around an already assembled pipeline
    pub fn with_pipeline(config: RagConfig, pipeline: ChatPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &ChatPipeline {
        &self.inner.pipeline
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        self.inner.pipeline.sessions()
    }
}
