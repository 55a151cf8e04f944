//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::constants::{answers, endpoints, models, rag, scoring, timeouts};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Retrieval and ranking
    #[serde(default)]
    pub rag: RagConfig,

    /// Query embedding provider
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Generative backends used by the router and the answer generator
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_rag()?;
        self.validate_embedding()?;
        self.validate_llm()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Must be non-zero"));
        }
        if self.server.timeout_seconds == 0 {
            return Err(invalid("server.timeout_seconds", "Must be at least 1"));
        }
        Ok(())
    }

    fn validate_rag(&self) -> Result<(), ConfigError> {
        let rag = &self.rag;

        if rag.top_k == 0 {
            return Err(invalid("rag.top_k", "Must be at least 1"));
        }

        if rag.candidate_multiplier == 0 {
            return Err(invalid("rag.candidate_multiplier", "Must be at least 1"));
        }

        if !(-1.0..=1.0).contains(&rag.score_threshold) {
            return Err(invalid(
                "rag.score_threshold",
                format!("Must be between -1.0 and 1.0, got {}", rag.score_threshold),
            ));
        }

        if rag.query_timeout_ms == 0 {
            return Err(invalid("rag.query_timeout_ms", "Must be at least 1"));
        }

        if rag.collections.is_empty() {
            return Err(invalid("rag.collections", "At least one book is required"));
        }

        if let Some((book, _)) = rag
            .collections
            .iter()
            .find(|(book, collection)| book.trim().is_empty() || collection.trim().is_empty())
        {
            return Err(invalid(
                "rag.collections",
                format!("Empty book or collection name in entry '{}'", book),
            ));
        }

        let weights = [
            ("rag.scoring.vector_weight", rag.scoring.vector_weight),
            ("rag.scoring.topic_boost", rag.scoring.topic_boost),
            ("rag.scoring.keyword_boost", rag.scoring.keyword_boost),
            ("rag.scoring.keyword_boost_cap", rag.scoring.keyword_boost_cap),
            ("rag.scoring.speaker_boost", rag.scoring.speaker_boost),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("Must be a non-negative number, got {}", value)));
            }
        }

        if rag.fallback_scan_limit == 0 {
            tracing::warn!("rag.fallback_scan_limit is 0, the lexical fallback will never match");
        }

        Ok(())
    }

    fn validate_embedding(&self) -> Result<(), ConfigError> {
        if self.embedding.timeout_ms == 0 {
            return Err(invalid("embedding.timeout_ms", "Must be at least 1"));
        }

        if self.embedding.provider == EmbeddingProvider::OpenAi && self.embedding.api_key.is_none() {
            if self.environment.is_strict() {
                return Err(ConfigError::MissingField("embedding.api_key".to_string()));
            }
            tracing::warn!("embedding.api_key is not set; OpenAI embedding requests will fail");
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if llm.connect_timeout_ms == 0 {
            return Err(invalid("llm.connect_timeout_ms", "Must be at least 1"));
        }
        if llm.request_timeout_ms == 0 {
            return Err(invalid("llm.request_timeout_ms", "Must be at least 1"));
        }
        if llm.max_quotes == 0 {
            return Err(invalid("llm.max_quotes", "Must be at least 1"));
        }

        if llm.backend.uses_local() {
            if llm.ollama_endpoint.trim().is_empty() {
                return Err(invalid("llm.ollama_endpoint", "Required by the local backend"));
            }
            if llm.ollama_model.trim().is_empty() {
                return Err(invalid("llm.ollama_model", "Required by the local backend"));
            }
        }

        if llm.backend.uses_gemini() && llm.gemini_api_key.is_none() {
            if self.environment.is_production() {
                return Err(ConfigError::MissingField("llm.gemini_api_key".to_string()));
            }
            tracing::warn!(
                backend = ?llm.backend,
                "llm.gemini_api_key is not set; Gemini requests will fail"
            );
        }

        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn default_true() -> bool {
    true
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_timeout() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Qdrant endpoint URL (gRPC)
    #[serde(default = "default_qdrant_endpoint")]
    pub qdrant_endpoint: String,

    /// Qdrant API key (optional, for cloud deployments)
    #[serde(default = "default_qdrant_api_key")]
    pub qdrant_api_key: Option<String>,

    /// Timeout for a single query or scan
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Book name → collection name
    #[serde(default = "default_collections")]
    pub collections: BTreeMap<String, String>,

    /// Passages returned per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum vector similarity for a candidate
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Vector candidates fetched per requested passage
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,

    /// Records read by the lexical fallback
    #[serde(default = "default_fallback_scan_limit")]
    pub fallback_scan_limit: usize,

    /// Speaker label that earns the speaker boost
    #[serde(default = "default_primary_speaker")]
    pub primary_speaker: String,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}
fn default_qdrant_api_key() -> Option<String> {
    std::env::var("QDRANT_API_KEY").ok()
}
fn default_query_timeout_ms() -> u64 {
    timeouts::VECTOR_QUERY_MS
}
fn default_collections() -> BTreeMap<String, String> {
    rag::COLLECTIONS
        .iter()
        .map(|(book, collection)| (book.to_string(), collection.to_string()))
        .collect()
}
fn default_top_k() -> usize {
    rag::DEFAULT_TOP_K
}
fn default_score_threshold() -> f32 {
    rag::DEFAULT_SCORE_THRESHOLD
}
fn default_candidate_multiplier() -> usize {
    rag::CANDIDATE_MULTIPLIER
}
fn default_fallback_scan_limit() -> usize {
    rag::FALLBACK_SCAN_LIMIT
}
fn default_primary_speaker() -> String {
    rag::PRIMARY_SPEAKER.to_string()
}

impl RagConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            qdrant_endpoint: default_qdrant_endpoint(),
            qdrant_api_key: default_qdrant_api_key(),
            query_timeout_ms: default_query_timeout_ms(),
            collections: default_collections(),
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            candidate_multiplier: default_candidate_multiplier(),
            fallback_scan_limit: default_fallback_scan_limit(),
            primary_speaker: default_primary_speaker(),
            scoring: ScoringConfig::default(),
        }
    }
}

/// Ranking weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,
    #[serde(default = "default_topic_boost")]
    pub topic_boost: f32,
    #[serde(default = "default_keyword_boost")]
    pub keyword_boost: f32,
    #[serde(default = "default_keyword_boost_cap")]
    pub keyword_boost_cap: f32,
    #[serde(default = "default_speaker_boost")]
    pub speaker_boost: f32,
}

fn default_vector_weight() -> f32 {
    scoring::VECTOR_WEIGHT
}
fn default_topic_boost() -> f32 {
    scoring::TOPIC_BOOST
}
fn default_keyword_boost() -> f32 {
    scoring::KEYWORD_BOOST
}
fn default_keyword_boost_cap() -> f32 {
    scoring::KEYWORD_BOOST_CAP
}
fn default_speaker_boost() -> f32 {
    scoring::SPEAKER_BOOST
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            vector_weight: default_vector_weight(),
            topic_boost: default_topic_boost(),
            keyword_boost: default_keyword_boost(),
            keyword_boost_cap: default_keyword_boost_cap(),
            speaker_boost: default_speaker_boost(),
        }
    }
}

/// Embedding provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Ollama,
    #[default]
    #[serde(alias = "open_ai")]
    OpenAi,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// Endpoint override (provider default when unset)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model override (provider default when unset)
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_openai_api_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,

    /// Expected vector length; every response is checked when set
    #[serde(default)]
    pub dimension: Option<usize>,
}

fn default_openai_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok()
}
fn default_embedding_timeout_ms() -> u64 {
    timeouts::EMBEDDING_MS
}

impl EmbeddingSettings {
    /// Configured endpoint or the provider's default
    pub fn endpoint(&self) -> &str {
        match (&self.endpoint, self.provider) {
            (Some(endpoint), _) => endpoint,
            (None, EmbeddingProvider::Ollama) => endpoints::OLLAMA_DEFAULT,
            (None, EmbeddingProvider::OpenAi) => endpoints::OPENAI_DEFAULT,
        }
    }

    /// Configured model or the provider's default
    pub fn model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, EmbeddingProvider::Ollama) => models::OLLAMA_EMBEDDING,
            (None, EmbeddingProvider::OpenAi) => models::OPENAI_EMBEDDING,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            endpoint: None,
            model: None,
            api_key: default_openai_api_key(),
            timeout_ms: default_embedding_timeout_ms(),
            dimension: None,
        }
    }
}

/// Which generative backend(s) to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendPolicy {
    /// Local Ollama only
    #[default]
    Local,
    /// Gemini only
    Gemini,
    /// Local Ollama, then Gemini if the local call fails
    LocalThenGemini,
}

impl BackendPolicy {
    pub fn uses_gemini(&self) -> bool {
        matches!(self, Self::Gemini | Self::LocalThenGemini)
    }

    pub fn uses_local(&self) -> bool {
        matches!(self, Self::Local | Self::LocalThenGemini)
    }
}

/// Generative backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub backend: BackendPolicy,

    #[serde(default = "default_ollama_endpoint")]
    pub ollama_endpoint: String,

    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    #[serde(default = "default_gemini_endpoint")]
    pub gemini_endpoint: String,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_gemini_api_key")]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Routing should be deterministic
    #[serde(default)]
    pub router_temperature: f32,

    #[serde(default = "default_explainer_temperature")]
    pub explainer_temperature: f32,

    /// Quotes placed into the generation prompt
    #[serde(default = "default_max_quotes")]
    pub max_quotes: usize,

    /// Retries on transient (network/5xx) failures, per backend
    #[serde(default)]
    pub max_retries: u32,
}

fn default_ollama_endpoint() -> String {
    endpoints::OLLAMA_DEFAULT.to_string()
}
fn default_ollama_model() -> String {
    models::OLLAMA_CHAT.to_string()
}
fn default_gemini_endpoint() -> String {
    endpoints::GEMINI_DEFAULT.to_string()
}
fn default_gemini_model() -> String {
    models::GEMINI_CHAT.to_string()
}
fn default_gemini_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY").ok()
}
fn default_connect_timeout_ms() -> u64 {
    timeouts::LLM_CONNECT_MS
}
fn default_request_timeout_ms() -> u64 {
    timeouts::LLM_REQUEST_MS
}
fn default_explainer_temperature() -> f32 {
    0.2
}
fn default_max_quotes() -> usize {
    answers::MAX_QUOTES
}

impl LlmSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            backend: BackendPolicy::default(),
            ollama_endpoint: default_ollama_endpoint(),
            ollama_model: default_ollama_model(),
            gemini_endpoint: default_gemini_endpoint(),
            gemini_model: default_gemini_model(),
            gemini_api_key: default_gemini_api_key(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            router_temperature: 0.0,
            explainer_temperature: default_explainer_temperature(),
            max_quotes: default_max_quotes(),
            max_retries: 0,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from `config/` in the working directory.
///
/// Priority: env vars > `config/{env}` > `config/default` > built-in defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from an explicit configuration directory
pub fn load_settings_from(config_dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(config_dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(config_dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("CLARITAS")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
