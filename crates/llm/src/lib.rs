//! LLM Integration
//!
//! Features:
//! - Ollama (local) and Gemini (hosted) chat backends
//! - Backend selection policy with local-then-hosted failover
//! - Book router that turns a question into a routing decision
//! - Quote-gated answer generation

pub mod backend;
pub mod explainer;
pub mod factory;
pub mod gemini;
pub mod prompt;
pub mod router;

pub use backend::{GenerationResult, LlmBackend, LlmConfig, OllamaBackend};
pub use explainer::{AnswerGenerator, GeneratorConfig};
pub use factory::{FailoverBackend, LlmFactory};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use prompt::{Message, Role};
pub use router::{parse_routing, BookRouter};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model replied, but not with the structure the caller asked for
    #[error("Unparseable model output")]
    UnparseableOutput { raw: String },

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Whether the backend itself could not be reached or failed to answer
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, LlmError::UnparseableOutput { .. })
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for claritas_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::UnparseableOutput { .. } => claritas_core::Error::Routing(err.to_string()),
            other => claritas_core::Error::Llm(other.to_string()),
        }
    }
}
