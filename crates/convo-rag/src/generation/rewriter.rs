//! Standalone-question rewriting

use std::sync::Arc;

use super::prompt::PromptBuilder;
use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::{ConversationLog, Turn};

/// Rewrites follow-up questions using the conversation so far
pub struct QueryRewriter {
    llm: Arc<dyn LlmProvider>,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Produce a question that stands on its own
    ///
    /// The raw question is sent as an extra user turn after `log`; `log`
    /// itself is only read. A blank model reply falls back to the raw
    /// question so the result is never empty.
    pub async fn rewrite(&self, question: &str, log: &ConversationLog) -> Result<String> {
        let turns = log.with_pending(Turn::user(question));
        let rewritten = self
            .llm
            .generate(PromptBuilder::rewrite_instruction(), &turns)
            .await?;

        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            tracing::warn!("Rewrite returned no text, using the original question");
            return Ok(question.to_string());
        }

        tracing::debug!("Rewrote \"{}\" as \"{}\"", question, rewritten);
        Ok(rewritten.to_string())
    }
}
