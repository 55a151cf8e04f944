//! Vector Store using Qdrant
//!
//! Read-only adapter: similarity search with a score threshold and a
//! bounded payload scroll for the lexical fallback.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        value::Kind, Query, QueryPointsBuilder, ScrollPointsBuilder, Value as QdrantValue,
    },
    Qdrant,
};
use serde_json::{Map, Number, Value};

use claritas_config::constants::{endpoints, timeouts};
use claritas_config::RagConfig;
use claritas_core::{Payload, ScoredPayload, VectorStoreAdapter};

use crate::RagError;

/// Vector store configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Qdrant gRPC endpoint
    pub endpoint: String,
    /// API key (optional)
    pub api_key: Option<String>,
    /// Per-call deadline
    pub timeout: Duration,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::QDRANT_DEFAULT.to_string(),
            api_key: None,
            timeout: Duration::from_millis(timeouts::VECTOR_QUERY_MS),
        }
    }
}

impl From<&RagConfig> for QdrantConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            endpoint: config.qdrant_endpoint.clone(),
            api_key: config.qdrant_api_key.clone(),
            timeout: config.query_timeout(),
        }
    }
}

/// Qdrant-backed [`VectorStoreAdapter`]
pub struct QdrantStore {
    client: Qdrant,
    config: QdrantConfig,
}

impl QdrantStore {
    /// Build a client. Does not contact the server.
    pub fn new(config: QdrantConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint).timeout(config.timeout);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &QdrantConfig {
        &self.config
    }

    async fn bounded<F, T>(&self, fut: F) -> Result<T, RagError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| RagError::Timeout(format!("Qdrant call exceeded {:?}", self.config.timeout)))
    }
}

#[async_trait]
impl VectorStoreAdapter for QdrantStore {
    async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: f32,
    ) -> claritas_core::Result<Vec<ScoredPayload>> {
        let request = QueryPointsBuilder::new(collection)
            .query(Query::new_nearest(vector))
            .limit(limit as u64)
            .score_threshold(score_threshold)
            .with_payload(true);

        let response = self
            .bounded(self.client.query(request))
            .await?
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| ScoredPayload::new(payload_to_json(point.payload), point.score))
            .collect())
    }

    async fn scan(&self, collection: &str, limit: usize) -> claritas_core::Result<Vec<Payload>> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        let request = ScrollPointsBuilder::new(collection)
            .limit(limit)
            .with_payload(true)
            .with_vectors(false);

        let response = self
            .bounded(self.client.scroll(request))
            .await?
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| payload_to_json(point.payload))
            .collect())
    }

    async fn collection_exists(&self, collection: &str) -> claritas_core::Result<bool> {
        let exists = self
            .bounded(self.client.collection_exists(collection))
            .await?
            .map_err(|e| RagError::VectorStore(e.to_string()))?;
        Ok(exists)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

fn payload_to_json(payload: HashMap<String, QdrantValue>) -> Payload {
    payload
        .into_iter()
        .map(|(k, v)| (k, value_to_json(v)))
        .collect()
}

/// Convert a Qdrant payload value into JSON
pub(crate) fn value_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(value_to_json).collect())
        },
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}
