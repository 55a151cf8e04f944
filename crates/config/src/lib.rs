//! Configuration management for Claritas
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default.*`, `config/{env}.*`)
//! - Environment variables (`CLARITAS__` prefix, `__` separator)
//! - Conventional secret variables (`OPENAI_API_KEY`, `GEMINI_API_KEY`, ...)

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, BackendPolicy, EmbeddingProvider, EmbeddingSettings,
    LlmSettings, ObservabilityConfig, RagConfig, RuntimeEnvironment, ScoringConfig, ServerConfig,
    Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
