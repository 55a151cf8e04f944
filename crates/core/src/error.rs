//! Error types shared across crate boundaries

use thiserror::Error;

/// Result alias using the core error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error
///
/// Crate-local errors (`RagError`, `LlmError`, ...) convert into this type
/// when they cross a trait seam.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Embedding provider unreachable or returned malformed output
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Transport, collection or adapter failure during vector search
    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Routing error: {0}")]
    Routing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::Embedding("provider returned 500".to_string());
        assert_eq!(err.to_string(), "Embedding error: provider returned 500");
    }
}
