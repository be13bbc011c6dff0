//! The conversational retrieval pipeline
//!
//! One exchange runs rewrite, retrieve and answer in that order under the
//! session's log lock. The log only changes once the answer is in hand.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{Answerer, QueryRewriter};
use crate::providers::google::{GeminiClient, GeminiEmbedder};
use crate::providers::pinecone::PineconeIndex;
use crate::providers::{EmbeddingProvider, LlmProvider, RetryPolicy, VectorStoreProvider};
use crate::retrieval::Retriever;
use crate::session::SessionStore;

/// Result of one exchange
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub answer: String,
    /// Question after rewriting, as sent to retrieval and answering
    pub standalone_question: String,
    pub chunks_used: usize,
}

/// Health of one collaborator
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn from_check(name: &str, check: Result<bool>) -> Self {
        match check {
            Ok(healthy) => Self {
                name: name.to_string(),
                healthy,
                error: None,
            },
            Err(e) => Self {
                name: name.to_string(),
                healthy: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Health of every collaborator
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub llm: ComponentHealth,
    pub embeddings: ComponentHealth,
    pub vector_store: ComponentHealth,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.llm.healthy && self.embeddings.healthy && self.vector_store.healthy
    }
}

/// Rewrite, retrieve and answer over per-session conversation logs
pub struct ChatPipeline {
    llm: Arc<dyn LlmProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
    rewriter: QueryRewriter,
    retriever: Retriever,
    answerer: Answerer,
    sessions: Arc<SessionStore>,
}

impl ChatPipeline {
    /// Assemble a pipeline from explicit providers
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        config: &RagConfig,
    ) -> Self {
        Self {
            rewriter: QueryRewriter::new(Arc::clone(&llm)),
            retriever: Retriever::new(
                Arc::clone(&embedder),
                Arc::clone(&vector_store),
                config.retrieval.clone(),
            ),
            answerer: Answerer::new(Arc::clone(&llm), config.prompts.clone()),
            sessions: Arc::new(SessionStore::new(&config.sessions)),
            llm,
            embedder,
            vector_store,
        }
    }

    /// Build the Gemini and Pinecone providers from configuration
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let retry = RetryPolicy::from_config(&config.resilience);

        let llm = Arc::new(GeminiClient::new(&config.llm, retry)?);
        let embedder = Arc::new(GeminiEmbedder::new(
            &config.embeddings,
            config.embedding_api_key(),
            retry,
        )?);
        let vector_store = Arc::new(PineconeIndex::new(&config.vector_db, retry)?);

        tracing::info!(
            "Providers initialized (llm: {}, embeddings: {}, index: {})",
            config.llm.model,
            config.embeddings.model,
            config
                .vector_db
                .index_name
                .as_deref()
                .or(config.vector_db.index_host.as_deref())
                .unwrap_or("unknown")
        );

        Ok(Self::new(llm, embedder, vector_store, config))
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.vector_store
    }

    /// Answer `question` within a session
    ///
    /// Without a session id a fresh session is started. On any failure the
    /// session log is left exactly as it was.
    pub async fn ask(&self, session_id: Option<&str>, question: &str) -> Result<ChatReply> {
        let start = Instant::now();
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(SessionStore::new_session_id);

        let session = self.sessions.get_or_create(&session_id);
        let mut log = session.log().lock().await;

        tracing::info!("[{}] Question: \"{}\"", session_id, question);

        let standalone = self.rewriter.rewrite(question, &log).await?;
        let chunks = self.retriever.retrieve(&standalone).await?;
        if chunks.is_empty() {
            tracing::info!("[{}] No supporting chunks found", session_id);
        }
        let context = self.retriever.build_context(&chunks);
        let answer = self.answerer.answer(&standalone, &context, &log).await?;

        log.commit_exchange(standalone.clone(), answer.clone());
        session.touch();

        tracing::info!(
            "[{}] Answered in {}ms using {} chunks ({} turns)",
            session_id,
            start.elapsed().as_millis(),
            chunks.len(),
            log.len()
        );

        Ok(ChatReply {
            session_id,
            answer,
            standalone_question: standalone,
            chunks_used: chunks.len(),
        })
    }

    /// Check every collaborator concurrently
    pub async fn health(&self) -> HealthReport {
        let (llm, embeddings, vector_store) = futures::join!(
            self.llm.health_check(),
            self.embedder.health_check(),
            self.vector_store.health_check()
        );

        HealthReport {
            llm: ComponentHealth::from_check(self.llm.name(), llm),
            embeddings: ComponentHealth::from_check(self.embedder.name(), embeddings),
            vector_store: ComponentHealth::from_check(self.vector_store.name(), vector_store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::mock::{HashEmbedder, MockProviders, ScriptedLlm, StaticVectorStore};
    use crate::types::Turn;

    fn pipeline(mocks: &MockProviders) -> ChatPipeline {
        ChatPipeline::new(
            mocks.llm.clone(),
            mocks.embedder.clone(),
            mocks.vector_store.clone(),
            &RagConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_ask_commits_standalone_question_and_answer() {
        let mocks = MockProviders::new(
            ScriptedLlm::fixed("A stack is LIFO."),
            HashEmbedder::new(8),
            StaticVectorStore::with_texts(["A stack is a LIFO structure."]),
        );
        let pipeline = pipeline(&mocks);

        let reply = pipeline.ask(Some("s1"), "What is a stack?").await.unwrap();

        assert_eq!(reply.session_id, "s1");
        assert_eq!(reply.answer, "A stack is LIFO.");
        assert_eq!(reply.chunks_used, 1);
        assert_eq!(
            pipeline.sessions().history("s1").await.unwrap(),
            vec![Turn::user("What is a stack?"), Turn::model("A stack is LIFO.")]
        );
        assert_eq!(mocks.vector_store.queries(), vec![10]);
    }

    #[tokio::test]
    async fn test_ask_without_session_starts_one() {
        let mocks = MockProviders::new(
            ScriptedLlm::fixed("ok"),
            HashEmbedder::new(8),
            StaticVectorStore::empty(),
        );
        let pipeline = pipeline(&mocks);

        let reply = pipeline.ask(None, "Hello?").await.unwrap();

        assert!(!reply.session_id.is_empty());
        assert_eq!(pipeline.sessions().history(&reply.session_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_retrieval_leaves_log_untouched() {
        let mocks = MockProviders::new(
            ScriptedLlm::fixed("unused"),
            HashEmbedder::failing(),
            StaticVectorStore::empty(),
        );
        let pipeline = pipeline(&mocks);

        let result = pipeline.ask(Some("s1"), "What is a queue?").await;

        assert!(matches!(result, Err(Error::Embedding(_))));
        assert!(pipeline.sessions().history("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_each_component() {
        let mocks = MockProviders::new(
            ScriptedLlm::fixed("ok"),
            HashEmbedder::failing(),
            StaticVectorStore::empty(),
        );
        let report = pipeline(&mocks).health().await;

        assert!(report.llm.healthy);
        assert!(!report.embeddings.healthy);
        assert!(report.vector_store.healthy);
        assert!(!report.is_healthy());
    }
}
