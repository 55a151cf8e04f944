//! OpenAI-compatible embeddings (`POST {endpoint}/embeddings`)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use claritas_config::constants::{endpoints, models, timeouts};
use claritas_core::Embedder;

use crate::ollama_embeddings::check_vector;
use crate::RagError;

#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API base, e.g. `https://api.openai.com/v1`
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub embedding_dim: Option<usize>,
    pub timeout: Duration,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::OPENAI_DEFAULT.to_string(),
            model: models::OPENAI_EMBEDDING.to_string(),
            api_key: None,
            embedding_dim: None,
            timeout: Duration::from_millis(timeouts::EMBEDDING_MS),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiEmbeddingConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiEmbeddingConfig) -> Result<Self, RagError> {
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
        let url = format!("{}/embeddings", self.config.endpoint.trim_end_matches('/'));

        let mut request = self.client.post(&url).json(&EmbeddingsRequest {
            model: &self.config.model,
            input: text,
        });
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "OpenAI embedding failed: {} - {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse OpenAI response: {}", e)))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagError::Embedding("No embedding returned".to_string()))?;

        check_vector(vector, self.config.embedding_dim)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> claritas_core::Result<Vec<f32>> {
        Ok(self.embed_raw(text).await?)
    }

    fn dim(&self) -> Option<usize> {
        self.config.embedding_dim
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,-0.2]}],"model":"m"}"#;
        let parsed: EmbeddingsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, -0.2]);
    }

    #[test]
    fn test_config_default() {
        let config = OpenAiEmbeddingConfig::default();
        assert_eq!(config.model, "text-embedding-3-large");
        assert!(config.api_key.is_none());
    }
}
