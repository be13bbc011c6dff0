//! Configuration for the chat backend

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "convo-rag.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "CONVO_RAG_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Generative model configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Vector index configuration
    pub vector_db: VectorDbConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Prompt wording
    pub prompts: PromptConfig,
    /// Timeouts and retries for collaborator calls
    pub resilience: ResilienceConfig,
    /// Conversation session configuration
    pub sessions: SessionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Allowed frontend origin; any origin when unset
    pub cors_origin: Option<String>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            cors_origin: None,
            max_body_size: 64 * 1024,
        }
    }
}

/// Generative model (Gemini) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Generative Language API base URL
    pub api_base: String,
    /// API key (usually from GEMINI_API_KEY)
    pub api_key: String,
    /// Generation model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.2,
            max_output_tokens: 2048,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Generative Language API base URL
    pub api_base: String,
    /// API key; falls back to the LLM key when empty
    pub api_key: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (768 for text-embedding-004)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model: "text-embedding-004".to_string(),
            dimensions: 768,
        }
    }
}

/// Vector index (Pinecone) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// API key (usually from PINECONE_API_KEY)
    pub api_key: String,
    /// Index name, resolved to a host through the control plane
    pub index_name: Option<String>,
    /// Data-plane host; skips the control-plane lookup when set
    pub index_host: Option<String>,
    /// Namespace to query (default namespace when unset)
    pub namespace: Option<String>,
    /// Control plane base URL
    pub control_plane_url: String,
    /// API version header value
    pub api_version: String,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_name: None,
            index_host: None,
            namespace: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per question
    pub top_k: usize,
    /// Separator placed between chunks in the context block
    pub separator: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            separator: "\n\n---\n\n".to_string(),
        }
    }
}

/// Prompt wording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Persona line opening the answer instruction
    pub persona: String,
    /// Sentence the model must reply with when the context lacks the answer
    pub fallback_answer: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: "You are a Data Structure and Algorithm Expert.".to_string(),
            fallback_answer: "I could not find the answer in the provided document.".to_string(),
        }
    }
}

/// Timeouts and retries applied to every collaborator call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Deadline for a single call in seconds
    pub request_timeout_secs: u64,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub initial_backoff_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_retries: 2,
            initial_backoff_ms: 500,
        }
    }
}

impl ResilienceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

/// Conversation session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Turns kept per session (0 = unbounded)
    pub max_turns: usize,
    /// Idle sessions older than this are dropped
    pub idle_timeout_secs: u64,
    /// How often the idle sweeper runs
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: 40,
            idle_timeout_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

impl RagConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve, load, apply environment overrides and validate
    ///
    /// Lookup order: `explicit`, `$CONVO_RAG_CONFIG`, `./convo-rag.toml`,
    /// `<config dir>/convo-rag/config.toml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::locate(explicit) {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                tracing::info!("No configuration file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("convo-rag").join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Overlay values from the environment
    ///
    /// Takes a lookup function so tests can supply a fake environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(key) = get("PINECONE_API_KEY") {
            self.vector_db.api_key = key;
        }
        if let Some(name) = get("PINECONE_INDEX_NAME") {
            self.vector_db.index_name = Some(name);
        }
        if let Some(host) = get("PINECONE_INDEX_HOST") {
            self.vector_db.index_host = Some(host);
        }
        if let Some(namespace) = get("PINECONE_NAMESPACE") {
            self.vector_db.namespace = Some(namespace);
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(origin) = get("CORS_ORIGIN") {
            self.server.cors_origin = Some(origin);
        }
    }

    /// API key used for embeddings
    pub fn embedding_api_key(&self) -> &str {
        if self.embeddings.api_key.is_empty() {
            &self.llm.api_key
        } else {
            &self.embeddings.api_key
        }
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.is_empty() {
            return Err(Error::Config(
                "Gemini API key missing (set GEMINI_API_KEY or llm.api_key)".to_string(),
            ));
        }
        if self.vector_db.api_key.is_empty() {
            return Err(Error::Config(
                "Pinecone API key missing (set PINECONE_API_KEY or vector_db.api_key)".to_string(),
            ));
        }
        if self.vector_db.index_host.is_none() && self.vector_db.index_name.is_none() {
            return Err(Error::Config(
                "Vector index missing (set PINECONE_INDEX_NAME or PINECONE_INDEX_HOST)".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.resilience.request_timeout_secs == 0 {
            return Err(Error::Config(
                "resilience.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.prompts.fallback_answer.trim().is_empty() {
            return Err(Error::Config("prompts.fallback_answer must not be empty".to_string()));
        }
        let max_turns = self.sessions.max_turns;
        if max_turns != 0 && (max_turns < 2 || max_turns % 2 != 0) {
            return Err(Error::Config(format!(
                "sessions.max_turns must be 0 (unbounded) or an even number of at least 2, got {}",
                max_turns
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.embeddings.model, "text-embedding-004");
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.prompts.fallback_answer,
            "I could not find the answer in the provided document."
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml_str(
            r#"
            [retrieval]
            top_k = 4

            [vector_db]
            index_name = "dsa"
            "#,
        )
        .unwrap();

        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.retrieval.separator, "\n\n---\n\n");
        assert_eq!(config.vector_db.index_name.as_deref(), Some("dsa"));
        assert_eq!(config.vector_db.control_plane_url, "https://api.pinecone.io");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 8088\n[llm]\nmodel = \"gemini-1.5-pro\"").unwrap();

        let config = RagConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.llm.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RagConfig::default();
        config.apply_env_overrides(env(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("PINECONE_API_KEY", "p-key"),
            ("PINECONE_INDEX_NAME", "dsa-notes"),
            ("PORT", "9000"),
        ]));

        assert_eq!(config.llm.api_key, "g-key");
        assert_eq!(config.embedding_api_key(), "g-key");
        assert_eq!(config.vector_db.api_key, "p-key");
        assert_eq!(config.vector_db.index_name.as_deref(), Some("dsa-notes"));
        assert_eq!(config.server.port, 9000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_ignored() {
        let mut config = RagConfig::default();
        config.apply_env_overrides(env(&[("PORT", "not-a-port")]));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_rejects_missing_index() {
        let mut config = RagConfig::default();
        config.llm.api_key = "g".to_string();
        config.vector_db.api_key = "p".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.vector_db.index_host = Some("dsa-abc.svc.pinecone.io".to_string());
        assert!(config.validate().is_ok());

        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_max_turns_keeps_whole_exchanges() {
        let mut config = RagConfig::default();
        config.apply_env_overrides(env(&[
            ("GEMINI_API_KEY", "g"),
            ("PINECONE_API_KEY", "p"),
            ("PINECONE_INDEX_NAME", "dsa"),
        ]));

        for accepted in [0, 2, 40] {
            config.sessions.max_turns = accepted;
            assert!(config.validate().is_ok(), "max_turns = {}", accepted);
        }
        for rejected in [1, 3, 41] {
            config.sessions.max_turns = rejected;
            assert!(
                matches!(config.validate(), Err(Error::Config(_))),
                "max_turns = {}",
                rejected
            );
        }
    }
}
