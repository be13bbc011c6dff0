//! LLM provider trait for rewriting questions and generating answers

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Turn;

/// Trait for generative language models
///
/// Both the rewrite and the answer step go through the same call shape: a
/// system instruction plus the ordered turns to continue.
///
/// Implementations:
/// - `GeminiClient`: Gemini `generateContent` (gemini-2.0-flash)
/// - `ScriptedLlm`: in-process double for tests
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate the next model turn for `turns` under `system_instruction`
    async fn generate(&self, system_instruction: &str, turns: &[Turn]) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
