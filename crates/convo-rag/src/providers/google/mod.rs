//! Google Generative Language API providers
//!
//! - Gemini `generateContent` for question rewriting and answering
//! - Gemini `embedContent` for query embeddings

mod embedder;
mod gemini_client;

pub use embedder::GeminiEmbedder;
pub use gemini_client::GeminiClient;

/// Header carrying the API key on every request
pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

/// Join the API base and a model-scoped method
pub(crate) fn model_url(api_base: &str, model: &str, method: Option<&str>) -> String {
    let base = api_base.trim_end_matches('/');
    let model = model.trim_start_matches("models/");
    match method {
        Some(method) => format!("{}/models/{}:{}", base, model, method),
        None => format!("{}/models/{}", base, model),
    }
}
