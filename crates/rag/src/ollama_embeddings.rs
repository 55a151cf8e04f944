//! Ollama Embeddings
//!
//! Uses Ollama's `/api/embed` endpoint for query vectors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use claritas_config::constants::{endpoints, models, timeouts};
use claritas_core::Embedder;

use crate::RagError;

/// Ollama embedding configuration
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingConfig {
    /// Ollama API endpoint
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Expected dimension, checked on every response when set
    pub embedding_dim: Option<usize>,
    pub timeout: Duration,
}

impl Default for OllamaEmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::OLLAMA_DEFAULT.to_string(),
            model: models::OLLAMA_EMBEDDING.to_string(),
            embedding_dim: None,
            timeout: Duration::from_millis(timeouts::EMBEDDING_MS),
        }
    }
}

/// Request to Ollama embedding API
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response from Ollama embedding API
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama embedder
pub struct OllamaEmbedder {
    client: Client,
    config: OllamaEmbeddingConfig,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaEmbeddingConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn embed_raw(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: text,
        };

        let url = format!("{}/api/embed", self.config.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Ollama embedding failed: {} - {}",
                status, text
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        let vector = embed_response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("No embedding returned".to_string()))?;

        check_vector(vector, self.config.embedding_dim)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> claritas_core::Result<Vec<f32>> {
        Ok(self.embed_raw(text).await?)
    }

    fn dim(&self) -> Option<usize> {
        self.config.embedding_dim
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Reject empty vectors and, when a dimension is configured, mismatches
pub(crate) fn check_vector(vector: Vec<f32>, expected: Option<usize>) -> Result<Vec<f32>, RagError> {
    if vector.is_empty() {
        return Err(RagError::Embedding("Empty embedding returned".to_string()));
    }
    match expected {
        Some(dim) if dim != vector.len() => Err(RagError::Embedding(format!(
            "Embedding dimension mismatch: expected {}, got {}",
            dim,
            vector.len()
        ))),
        _ => Ok(vector),
    }
}
