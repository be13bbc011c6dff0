//! In-process providers for tests and offline runs
//!
//! Each double records the calls it receives so tests can assert on the
//! exact payloads the pipeline produced.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::prompt::REWRITE_INSTRUCTION;
use crate::providers::embedding::EmbeddingProvider;
use crate::providers::llm::LlmProvider;
use crate::providers::vector_store::{VectorMatch, VectorStoreProvider};
use crate::types::Turn;

/// One recorded `generate` call
#[derive(Debug, Clone)]
pub struct LlmCall {
    pub system_instruction: String,
    pub turns: Vec<Turn>,
}

impl LlmCall {
    /// Whether this call was the standalone-question rewrite
    pub fn is_rewrite(&self) -> bool {
        self.system_instruction == REWRITE_INSTRUCTION
    }

    /// Text of the final turn
    pub fn last_text(&self) -> &str {
        self.turns.last().map(|t| t.text.as_str()).unwrap_or_default()
    }
}

type Responder = dyn Fn(&LlmCall) -> Result<String> + Send + Sync;

/// LLM double driven by a closure
pub struct ScriptedLlm {
    responder: Box<Responder>,
    calls: Mutex<Vec<LlmCall>>,
}

impl ScriptedLlm {
    /// Respond to every call with `responder`
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&LlmCall) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Rewrites by echoing the question and answers with a fixed string
    pub fn fixed(answer: impl Into<String>) -> Self {
        let answer = answer.into();
        Self::new(move |call| {
            if call.is_rewrite() {
                Ok(call.last_text().to_string())
            } else {
                Ok(answer.clone())
            }
        })
    }

    /// Fails every call with an LLM error carrying `message`
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(Error::llm(message.clone())))
    }

    /// Snapshot of the calls received so far
    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, system_instruction: &str, turns: &[Turn]) -> Result<String> {
        let call = LlmCall {
            system_instruction: system_instruction.to_string(),
            turns: turns.to_vec(),
        };
        self.calls.lock().push(call.clone());
        (self.responder)(&call)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Deterministic embedder that folds bytes into a fixed-size vector
pub struct HashEmbedder {
    dimensions: usize,
    texts: Mutex<Vec<String>>,
    fail: bool,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            texts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// An embedder whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(8)
        }
    }

    /// Texts embedded so far
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.texts.lock().push(text.to_string());
        if self.fail {
            return Err(Error::embedding("embedding service rejected the request"));
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dimensions] += f32::from(byte) / 255.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Vector store double returning a fixed match list
pub struct StaticVectorStore {
    matches: Vec<VectorMatch>,
    queries: Mutex<Vec<usize>>,
}

impl StaticVectorStore {
    pub fn new(matches: Vec<VectorMatch>) -> Self {
        Self {
            matches,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// A store holding one match per text, scored in descending order
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let matches = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                VectorMatch::with_text(format!("chunk-{}", i), 1.0 / (i as f32 + 1.0), text)
            })
            .collect();
        Self::new(matches)
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// `top_k` values of the queries received so far
    pub fn queries(&self) -> Vec<usize> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl VectorStoreProvider for StaticVectorStore {
    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        self.queries.lock().push(top_k);
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Shared handles to a set of doubles, for tests that inspect them afterwards
#[derive(Clone)]
pub struct MockProviders {
    pub llm: Arc<ScriptedLlm>,
    pub embedder: Arc<HashEmbedder>,
    pub vector_store: Arc<StaticVectorStore>,
}

impl MockProviders {
    pub fn new(llm: ScriptedLlm, embedder: HashEmbedder, vector_store: StaticVectorStore) -> Self {
        Self {
            llm: Arc::new(llm),
            embedder: Arc::new(embedder),
            vector_store: Arc::new(vector_store),
        }
    }
}
