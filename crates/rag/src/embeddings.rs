//! Embedder selection from settings

use std::sync::Arc;

use claritas_config::{EmbeddingProvider, EmbeddingSettings};
use claritas_core::Embedder;

use crate::ollama_embeddings::{OllamaEmbedder, OllamaEmbeddingConfig};
use crate::openai_embeddings::{OpenAiEmbedder, OpenAiEmbeddingConfig};
use crate::RagError;

/// Build the configured query embedder
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>, RagError> {
    let embedder: Arc<dyn Embedder> = match settings.provider {
        EmbeddingProvider::Ollama => Arc::new(OllamaEmbedder::new(OllamaEmbeddingConfig {
            endpoint: settings.endpoint().to_string(),
            model: settings.model().to_string(),
            embedding_dim: settings.dimension,
            timeout: settings.timeout(),
        })?),
        EmbeddingProvider::OpenAi => Arc::new(OpenAiEmbedder::new(OpenAiEmbeddingConfig {
            endpoint: settings.endpoint().to_string(),
            model: settings.model().to_string(),
            api_key: settings.api_key.clone(),
            embedding_dim: settings.dimension,
            timeout: settings.timeout(),
        })?),
    };

    tracing::info!(
        provider = embedder.name(),
        model = settings.model(),
        endpoint = settings.endpoint(),
        dim = ?embedder.dim(),
        "Embedder initialized"
    );

    Ok(embedder)
}
