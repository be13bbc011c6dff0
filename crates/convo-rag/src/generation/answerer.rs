//! Grounded answer generation

use std::sync::Arc;

use super::prompt::PromptBuilder;
use crate::config::PromptConfig;
use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::{ConversationLog, Turn};

/// Answers a standalone question strictly from the supplied context
pub struct Answerer {
    llm: Arc<dyn LlmProvider>,
    prompts: PromptConfig,
}

impl Answerer {
    pub fn new(llm: Arc<dyn LlmProvider>, prompts: PromptConfig) -> Self {
        Self { llm, prompts }
    }

    /// Generate the answer for `question` given `context`
    ///
    /// The model sees `log` followed by the standalone question as the
    /// newest user turn. An empty context is still sent; the instruction
    /// makes the model reply with the fallback sentence.
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        log: &ConversationLog,
    ) -> Result<String> {
        let instruction = PromptBuilder::answer_instruction(&self.prompts, context);
        let turns = log.with_pending(Turn::user(question));

        let answer = self.llm.generate(&instruction, &turns).await?;
        Ok(answer.trim().to_string())
    }
}
