//! Embedding-based chunk retrieval

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, VectorStoreProvider};

/// A chunk of supporting text returned for one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Vector id in the index
    pub id: String,
    /// Chunk text from `metadata.text`
    pub text: String,
    /// Index-reported similarity score
    pub score: f32,
}

/// Maps a standalone question to ranked supporting chunks
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            config,
        }
    }

    /// Embed `question` and fetch the `top_k` nearest chunks, best first
    ///
    /// Matches without a string `text` metadata field carry nothing usable
    /// and are skipped. An empty result is valid.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        let embedding = self.embedder.embed(question).await?;
        let matches = self.vector_store.query(&embedding, self.config.top_k).await?;
        let total = matches.len();

        let chunks: Vec<RetrievedChunk> = matches
            .into_iter()
            .filter_map(|m| match m.text() {
                Some(text) => {
                    let text = text.to_string();
                    Some(RetrievedChunk {
                        id: m.id,
                        text,
                        score: m.score,
                    })
                }
                None => {
                    tracing::warn!("Match {} has no text metadata, skipping", m.id);
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Retrieved {} chunks ({} matches) from {}",
            chunks.len(),
            total,
            self.vector_store.name()
        );
        Ok(chunks)
    }

    /// Join chunk texts with the separator and sanitize the result
    pub fn build_context(&self, chunks: &[RetrievedChunk]) -> String {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let context = PromptBuilder::build_context(&texts, &self.config.separator);
        PromptBuilder::sanitize_context(&context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{HashEmbedder, StaticVectorStore};
    use crate::providers::VectorMatch;

    fn retriever(store: StaticVectorStore, top_k: usize) -> (Retriever, Arc<StaticVectorStore>) {
        let store = Arc::new(store);
        let retriever = Retriever::new(
            Arc::new(HashEmbedder::new(16)),
            store.clone(),
            RetrievalConfig {
                top_k,
                ..RetrievalConfig::default()
            },
        );
        (retriever, store)
    }

    #[tokio::test]
    async fn test_retrieve_keeps_index_order_and_limit() {
        let (retriever, store) = retriever(
            StaticVectorStore::with_texts(["best", "second", "third", "fourth"]),
            3,
        );

        let chunks = retriever.retrieve("What is a heap?").await.unwrap();

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["best", "second", "third"]);
        assert_eq!(store.queries(), vec![3]);
    }

    #[tokio::test]
    async fn test_matches_without_text_are_skipped() {
        let store = StaticVectorStore::new(vec![
            VectorMatch {
                id: "orphan".to_string(),
                score: 0.9,
                metadata: None,
            },
            VectorMatch::with_text("c1", 0.8, "A queue is FIFO."),
        ]);
        let (retriever, _) = retriever(store, 10);

        let chunks = retriever.retrieve("queue").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "c1");
    }

    #[tokio::test]
    async fn test_no_matches_is_empty_context() {
        let (retriever, _) = retriever(StaticVectorStore::empty(), 10);

        let chunks = retriever.retrieve("anything").await.unwrap();
        assert!(chunks.is_empty());
        assert_eq!(retriever.build_context(&chunks), "");
    }

    #[test]
    fn test_context_is_joined_and_sanitized() {
        let (retriever, _) = retriever(StaticVectorStore::empty(), 10);
        let chunks = vec![
            RetrievedChunk {
                id: "a".to_string(),
                text: "**Stack**: push_back".to_string(),
                score: 0.9,
            },
            RetrievedChunk {
                id: "b".to_string(),
                text: "_Queue_".to_string(),
                score: 0.8,
            },
        ];

        let context = retriever.build_context(&chunks);
        assert_eq!(context, "--Stack--: push-back\n\n---\n\n-Queue-");
        assert!(!context.contains('*') && !context.contains('_'));
    }
}
