//! Hybrid Retriever
//!
//! Embeds the enriched query, over-fetches candidates from the book's
//! collection, re-ranks them with metadata boosts and returns the top K.
//! When the vector store is unreachable, degrades to a bounded lexical scan.

use std::sync::Arc;

use serde::Serialize;

use claritas_config::constants::rag;
use claritas_config::RagConfig;
use claritas_core::{
    Embedder, Error, PassageRecord, QueryContext, Result, ScoredPayload, VectorStoreAdapter,
};

use crate::collections::CollectionMap;
use crate::scoring::{QueryScorer, ScoredCandidate, ScoringWeights};

/// Retriever configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Candidates fetched per requested result
    pub candidate_multiplier: usize,
    /// Maximum records inspected by the lexical fallback
    pub fallback_scan_limit: usize,
    /// Score composition weights
    pub weights: ScoringWeights,
    /// Speaker that earns the attribution boost
    pub primary_speaker: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            candidate_multiplier: rag::CANDIDATE_MULTIPLIER,
            fallback_scan_limit: rag::FALLBACK_SCAN_LIMIT,
            weights: ScoringWeights::default(),
            primary_speaker: rag::PRIMARY_SPEAKER.to_string(),
        }
    }
}

impl From<&RagConfig> for RetrieverConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            candidate_multiplier: config.candidate_multiplier,
            fallback_scan_limit: config.fallback_scan_limit,
            weights: ScoringWeights::from(&config.scoring),
            primary_speaker: config.primary_speaker.clone(),
        }
    }
}

/// How a result set was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Vector search plus metadata re-ranking
    Vector,
    /// Lexical scan after a vector store failure
    Fallback,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Vector => "vector",
            RetrievalMode::Fallback => "fallback",
        }
    }
}

/// Ranked passages plus the path that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    pub passages: Vec<PassageRecord>,
    pub mode: RetrievalMode,
}

impl Retrieval {
    fn vector(passages: Vec<PassageRecord>) -> Self {
        Self {
            passages,
            mode: RetrievalMode::Vector,
        }
    }

    fn fallback(passages: Vec<PassageRecord>) -> Self {
        Self {
            passages,
            mode: RetrievalMode::Fallback,
        }
    }
}

/// Readiness of one mapped collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    pub book: String,
    pub collection: String,
    /// `ok`, `missing` or `unreachable`
    pub status: &'static str,
}

impl CollectionStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Hybrid retriever: dense search with metadata re-ranking
pub struct HybridRetriever {
    config: RetrieverConfig,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStoreAdapter>,
    collections: CollectionMap,
}

impl HybridRetriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStoreAdapter>,
        collections: CollectionMap,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            config,
            embedder,
            store,
            collections,
        }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn collections(&self) -> &CollectionMap {
        &self.collections
    }

    /// Check every mapped collection on the vector store
    pub async fn check_collections(&self) -> Vec<CollectionStatus> {
        let mut statuses = Vec::with_capacity(self.collections.len());
        for (book, collection) in self.collections.iter() {
            let status = match self.store.collection_exists(collection).await {
                Ok(true) => "ok",
                Ok(false) => "missing",
                Err(e) => {
                    tracing::warn!(error = %e, collection, "Collection check failed");
                    "unreachable"
                },
            };
            statuses.push(CollectionStatus {
                book: book.to_string(),
                collection: collection.to_string(),
                status,
            });
        }
        statuses
    }

    /// Top `top_k` passages for the query, best first.
    ///
    /// Returns an empty list for an unrecognized book or when nothing
    /// clears `score_threshold`. Embedding failures propagate.
    pub async fn retrieve(
        &self,
        ctx: &QueryContext,
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<PassageRecord>> {
        self.retrieve_detailed(ctx, top_k, score_threshold)
            .await
            .map(|r| r.passages)
    }

    /// Like [`retrieve`](Self::retrieve), also reporting whether the
    /// lexical fallback served the request.
    pub async fn retrieve_detailed(
        &self,
        ctx: &QueryContext,
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Retrieval> {
        if top_k == 0 {
            return Err(Error::InvalidArgument("top_k must be at least 1".to_string()));
        }

        let Some(collection) = self.collections.resolve(&ctx.book) else {
            tracing::info!(book = %ctx.book, "Unrecognized book, nothing to retrieve");
            return Ok(Retrieval::vector(Vec::new()));
        };

        let enriched = ctx.enriched_query();
        tracing::debug!(
            question = %ctx.question,
            enriched = %enriched,
            collection,
            "Query enriched with router tags"
        );

        let vector = self.embedder.embed(&enriched).await?;

        let candidate_limit = top_k.saturating_mul(self.config.candidate_multiplier.max(1));
        let candidates = match self
            .store
            .query(collection, vector, candidate_limit, score_threshold)
            .await
        {
            Ok(candidates) => candidates,
            // Any adapter failure degrades; only embedding errors propagate
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    collection,
                    store = self.store.name(),
                    "Vector search failed, using lexical fallback"
                );
                let passages = self.lexical_fallback(ctx, collection, top_k).await;
                return Ok(Retrieval::fallback(passages));
            },
        };

        if candidates.is_empty() {
            tracing::debug!(collection, score_threshold, "No candidates above threshold");
            return Ok(Retrieval::vector(Vec::new()));
        }

        let ranked = self.rank(ctx, candidates, top_k);
        tracing::debug!(
            collection,
            returned = ranked.len(),
            top_k,
            "Hybrid ranking complete"
        );

        Ok(Retrieval::vector(
            ranked.into_iter().map(|c| c.record).collect(),
        ))
    }

    /// Score, stable-sort and truncate a candidate set
    fn rank(
        &self,
        ctx: &QueryContext,
        candidates: Vec<ScoredPayload>,
        top_k: usize,
    ) -> Vec<ScoredCandidate> {
        let scorer = QueryScorer::new(self.config.weights, &self.config.primary_speaker, ctx);

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let record = PassageRecord::from_payload(&candidate.payload);
                let score = scorer.score(&record, candidate.score);
                tracing::debug!(
                    chunk_id = %record.chunk_id,
                    speaker = %record.speaker,
                    topic = %record.topic,
                    vector = score.vector_score,
                    topic_boost = score.topic_boost,
                    keyword_boost = score.keyword_boost,
                    speaker_boost = score.speaker_boost,
                    final_score = score.final_score,
                    preview = record.preview(200),
                    "Candidate scored"
                );
                ScoredCandidate { record, score }
            })
            .collect();

        // sort_by is stable: equal scores keep store order, NaN sinks last
        scored.sort_by(|a, b| {
            rank_key(b.score.final_score).total_cmp(&rank_key(a.score.final_score))
        });
        scored.truncate(top_k);
        scored
    }

    /// Bounded substring scan used when vector search is down.
    ///
    /// Inspects at most `fallback_scan_limit` records and keeps those whose
    /// text contains any lowercased term of the raw question, in scan order.
    /// Never fails; a scan error yields an empty result.
    async fn lexical_fallback(
        &self,
        ctx: &QueryContext,
        collection: &str,
        limit: usize,
    ) -> Vec<PassageRecord> {
        let terms = ctx.lexical_terms();
        if terms.is_empty() {
            return Vec::new();
        }

        let records = match self
            .store
            .scan(collection, self.config.fallback_scan_limit)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, collection, "Lexical fallback scan failed");
                return Vec::new();
            },
        };

        let matches: Vec<PassageRecord> = records
            .iter()
            .take(self.config.fallback_scan_limit)
            .map(PassageRecord::from_payload)
            .filter(|record| {
                let text = record.text.to_lowercase();
                terms.iter().any(|term| text.contains(term.as_str()))
            })
            .take(limit)
            .collect();

        tracing::info!(
            collection,
            scanned = records.len(),
            matched = matches.len(),
            "Lexical fallback complete"
        );
        matches
    }
}

/// Total order for ranking; NaN scores compare below every real score
fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}
