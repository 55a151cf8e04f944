//! Vector store adapter trait

use async_trait::async_trait;

use crate::passage::{Payload, ScoredPayload};
use crate::Result;

/// Nearest-neighbour search over named collections.
///
/// Failures are reported as [`crate::Error::VectorStore`]. The ranker
/// degrades to [`VectorStoreAdapter::scan`] whenever `query` fails.
#[async_trait]
pub trait VectorStoreAdapter: Send + Sync + 'static {
    /// Similarity search within `collection`.
    ///
    /// Results are ordered by the store's own similarity ranking (best
    /// first) and only include points scoring at least `score_threshold`.
    async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: f32,
    ) -> Result<Vec<ScoredPayload>>;

    /// Read up to `limit` stored payloads, in no particular relevance order
    async fn scan(&self, collection: &str, limit: usize) -> Result<Vec<Payload>>;

    /// Whether `collection` exists on a reachable backend
    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let _ = collection;
        Ok(true)
    }

    /// Backend name for logging
    fn name(&self) -> &str;
}
