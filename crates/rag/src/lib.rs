//! Retrieval for grounded answers
//!
//! Features:
//! - Dense vector search via Qdrant
//! - Metadata boosts (router topics, router keywords, primary speaker)
//! - Deterministic top-K ordering with stable tie-breaks
//! - Lexical scan fallback when vector search is unavailable
//! - Ollama and OpenAI query embedders

pub mod collections;
pub mod embeddings;
pub mod ollama_embeddings;
pub mod openai_embeddings;
pub mod retriever;
pub mod scoring;
pub mod vector_store;

pub use collections::CollectionMap;
pub use embeddings::create_embedder;
pub use ollama_embeddings::{OllamaEmbedder, OllamaEmbeddingConfig};
pub use openai_embeddings::{OpenAiEmbedder, OpenAiEmbeddingConfig};
pub use retriever::{
    CollectionStatus, HybridRetriever, Retrieval, RetrievalMode, RetrieverConfig,
};
pub use scoring::{QueryScorer, ScoreBreakdown, ScoredCandidate, ScoringWeights};
pub use vector_store::{QdrantConfig, QdrantStore};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<RagError> for claritas_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Embedding(msg) => claritas_core::Error::Embedding(msg),
            RagError::VectorStore(msg) | RagError::Connection(msg) | RagError::Timeout(msg) => {
                claritas_core::Error::VectorStore(msg)
            },
            RagError::InvalidArgument(msg) => claritas_core::Error::InvalidArgument(msg),
        }
    }
}
