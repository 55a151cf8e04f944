//! Application State
//!
//! Shared state across all handlers. Built once at startup; every field is
//! read-only afterwards.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use claritas_config::Settings;
use claritas_core::{Embedder, VectorStoreAdapter};
use claritas_llm::{AnswerGenerator, BookRouter, GeneratorConfig, LlmBackend, LlmFactory};
use claritas_rag::{
    create_embedder, CollectionMap, HybridRetriever, QdrantConfig, QdrantStore, RetrieverConfig,
};

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub router: Arc<BookRouter>,
    pub retriever: Arc<HybridRetriever>,
    pub generator: Arc<AnswerGenerator>,
    /// Backend shared by the router and the generator, checked by `/ready`
    pub llm: Arc<dyn LlmBackend>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the pipeline from already-built collaborators
    pub fn new(
        config: Settings,
        llm: Arc<dyn LlmBackend>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStoreAdapter>,
    ) -> Self {
        let retriever = HybridRetriever::new(
            embedder,
            store,
            CollectionMap::from(&config.rag),
            RetrieverConfig::from(&config.rag),
        );
        let router = BookRouter::new(llm.clone(), config.llm.router_temperature);
        let generator = AnswerGenerator::new(
            llm.clone(),
            GeneratorConfig::from_settings(&config.llm, &config.rag.primary_speaker),
        );

        Self {
            config: Arc::new(config),
            router: Arc::new(router),
            retriever: Arc::new(retriever),
            generator: Arc::new(generator),
            llm,
            metrics: None,
        }
    }

    /// Build the concrete Ollama/Gemini, embedding and Qdrant clients
    pub fn from_settings(config: Settings) -> Result<Self, ServerError> {
        let llm = LlmFactory::create(&config.llm)
            .map_err(|e| ServerError::Internal(format!("LLM backend: {}", e)))?;
        let embedder = create_embedder(&config.embedding)
            .map_err(|e| ServerError::Internal(format!("Embedder: {}", e)))?;
        let store = QdrantStore::new(QdrantConfig::from(&config.rag))
            .map_err(|e| ServerError::Internal(format!("Qdrant: {}", e)))?;

        Ok(Self::new(config, llm, embedder, Arc::new(store)))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
