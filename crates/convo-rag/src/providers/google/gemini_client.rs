//! Gemini client for question rewriting and answer generation
//!
//! Talks to the Generative Language API `generateContent` method with a
//! system instruction and the conversation turns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{model_url, API_KEY_HEADER};
use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::llm::LlmProvider;
use crate::providers::{ensure_success, http_client, RetryPolicy};
use crate::types::Turn;

const SERVICE: &str = "gemini";

/// Gemini client via the Generative Language API
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    generation: GenerationConfig,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &LlmConfig, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            generation: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
            retry,
        })
    }

    fn endpoint(&self) -> String {
        model_url(&self.api_base, &self.model, Some("generateContent"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: SystemInstruction<'a>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(system_instruction: &'a str, turns: &'a [Turn], generation: GenerationConfig) -> Self {
        Self {
            contents: turns
                .iter()
                .map(|turn| Content {
                    role: turn.role.as_str(),
                    parts: vec![Part { text: &turn.text }],
                })
                .collect(),
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: system_instruction,
                }],
            },
            generation_config: generation,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    pub(crate) fn into_text(self) -> Result<String> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(Error::llm(match block_reason {
                Some(reason) => format!("Gemini blocked the prompt: {}", reason),
                None => "No candidates in Gemini response".to_string(),
            }));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::llm(format!(
                "No text in Gemini response (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, system_instruction: &str, turns: &[Turn]) -> Result<String> {
        let url = self.endpoint();
        let request = GenerateContentRequest::new(system_instruction, turns, self.generation);

        tracing::debug!("Calling {} with {} turns", self.model, turns.len());

        let url = url.as_str();
        let request = &request;
        self.retry
            .run(SERVICE, move || async move {
                let response = self
                    .http
                    .post(url)
                    .header(API_KEY_HEADER, &self.api_key)
                    .json(request)
                    .send()
                    .await?;
                let response = ensure_success(SERVICE, response).await?;

                let parsed: GenerateContentResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::llm(format!("Failed to parse Gemini response: {}", e)))?;
                parsed.into_text()
            })
            .await
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

    fn model(&self) -> &str {
        &self.model
    }
}
