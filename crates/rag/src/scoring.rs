//! Hybrid score composition
//!
//! `final = vector_weight * vector_score + topic + keyword + speaker`
//!
//! - topic: flat boost when any router topic is a case-insensitive
//!   substring of the passage topic (never summed across topics)
//! - keyword: per-keyword boost for each router keyword found in the
//!   passage text, capped
//! - speaker: flat boost when the speaker equals the primary author exactly
//!
//! Scores depend only on the candidate payload and the query context.

use claritas_config::ScoringConfig;
use claritas_core::{PassageRecord, QueryContext};

/// Ranking weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub vector_weight: f32,
    pub topic_boost: f32,
    pub keyword_boost: f32,
    pub keyword_boost_cap: f32,
    pub speaker_boost: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::from(&ScoringConfig::default())
    }
}

impl From<&ScoringConfig> for ScoringWeights {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            vector_weight: config.vector_weight,
            topic_boost: config.topic_boost,
            keyword_boost: config.keyword_boost,
            keyword_boost_cap: config.keyword_boost_cap,
            speaker_boost: config.speaker_boost,
        }
    }
}

/// Per-candidate score components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub vector_score: f32,
    pub topic_boost: f32,
    pub keyword_boost: f32,
    pub speaker_boost: f32,
    pub final_score: f32,
}

/// A passage with its composed score. Never leaves the ranker.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub record: PassageRecord,
    pub score: ScoreBreakdown,
}

/// Scorer bound to one query's router tags
#[derive(Debug, Clone)]
pub struct QueryScorer<'a> {
    weights: ScoringWeights,
    primary_speaker: &'a str,
    topics: Vec<String>,
    keywords: Vec<String>,
}

impl<'a> QueryScorer<'a> {
    /// Prepare lowercased tags once per query.
    ///
    /// Tags are not trimmed; only empty tags are dropped since they would
    /// match every label.
    pub fn new(weights: ScoringWeights, primary_speaker: &'a str, ctx: &QueryContext) -> Self {
        Self {
            weights,
            primary_speaker,
            topics: normalize_tags(&ctx.topics),
            keywords: normalize_tags(&ctx.keywords),
        }
    }

    pub fn topic_boost(&self, record: &PassageRecord) -> f32 {
        if self.topics.is_empty() {
            return 0.0;
        }
        let label = record.topic.to_lowercase();
        if self.topics.iter().any(|topic| label.contains(topic.as_str())) {
            self.weights.topic_boost
        } else {
            0.0
        }
    }

    pub fn keyword_boost(&self, record: &PassageRecord) -> f32 {
        if self.keywords.is_empty() {
            return 0.0;
        }
        let text = record.text.to_lowercase();
        let matches = self
            .keywords
            .iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .count();
        (matches as f32 * self.weights.keyword_boost).min(self.weights.keyword_boost_cap)
    }

    pub fn speaker_boost(&self, record: &PassageRecord) -> f32 {
        if record.speaker == self.primary_speaker {
            self.weights.speaker_boost
        } else {
            0.0
        }
    }

    /// Compose the final score for one candidate
    pub fn score(&self, record: &PassageRecord, vector_score: f32) -> ScoreBreakdown {
        let topic_boost = self.topic_boost(record);
        let keyword_boost = self.keyword_boost(record);
        let speaker_boost = self.speaker_boost(record);

        ScoreBreakdown {
            vector_score,
            topic_boost,
            keyword_boost,
            speaker_boost,
            final_score: self.weights.vector_weight * vector_score
                + topic_boost
                + keyword_boost
                + speaker_boost,
        }
    }
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, topic: &str, speaker: &str) -> PassageRecord {
        PassageRecord {
            chunk_id: "c".to_string(),
            text: text.to_string(),
            speaker: speaker.to_string(),
            source: String::new(),
            topic: topic.to_string(),
        }
    }

    fn ctx(topics: &[&str], keywords: &[&str]) -> QueryContext {
        QueryContext::new("q", "Life Eternal")
            .with_topics(topics.iter().copied())
            .with_keywords(keywords.iter().copied())
    }

    #[test]
    fn test_reference_scenario() {
        let ctx = ctx(&["Suffering"], &["pain"]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &ctx);
        let r = record("Pain is necessary for...", "Suffering", "Meher Baba");

        let s = scorer.score(&r, 0.5);
        assert_eq!(s.topic_boost, 0.10);
        assert_eq!(s.keyword_boost, 0.05);
        assert_eq!(s.speaker_boost, 0.05);
        assert!((s.final_score - 0.60).abs() < 1e-6);
    }

    #[test]
    fn test_topic_boost_is_binary() {
        let ctx = ctx(&["love", "LOVE", "divine love"], &[]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &ctx);

        assert_eq!(scorer.topic_boost(&record("", "Divine Love", "x")), 0.10);
        assert_eq!(scorer.topic_boost(&record("", "Maya", "x")), 0.0);
    }

    #[test]
    fn test_topic_match_is_substring_of_label() {
        let short = ctx(&["surrender"], &[]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &short);
        assert_eq!(scorer.topic_boost(&record("", "Surrender and Obedience", "x")), 0.10);

        // Label inside tag does not count
        let long = ctx(&["surrender and obedience"], &[]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &long);
        assert_eq!(scorer.topic_boost(&record("", "Surrender", "x")), 0.0);
    }

    #[test]
    fn test_keyword_boost_is_capped() {
        let ctx = ctx(&[], &["pain", "suffering", "grace", "love", "god"]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &ctx);
        let r = record("Pain and suffering come by grace; love God.", "", "x");

        let boost = scorer.keyword_boost(&r);
        assert!((boost - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_keyword_boost_counts_each_match() {
        let ctx = ctx(&[], &["Pain", "grace", "absent"]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &ctx);
        let boost = scorer.keyword_boost(&record("pain brings grace", "", "x"));
        assert!((boost - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_empty_tags_ignored() {
        let ctx = ctx(&[""], &["", ""]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &ctx);
        let r = record("anything", "anything", "x");
        assert_eq!(scorer.topic_boost(&r), 0.0);
        assert_eq!(scorer.keyword_boost(&r), 0.0);
    }

    #[test]
    fn test_tags_are_not_trimmed() {
        let ctx = ctx(&[" suffering"], &[" pain"]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &ctx);

        // Leading space must be present in the label/text
        let bare = record("Pain is necessary", "Suffering", "x");
        assert_eq!(scorer.topic_boost(&bare), 0.0);
        assert_eq!(scorer.keyword_boost(&bare), 0.0);

        let spaced = record("Through pain we grow", "Human Suffering", "x");
        assert_eq!(scorer.topic_boost(&spaced), 0.10);
        assert!((scorer.keyword_boost(&spaced) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_speaker_boost_exact_match() {
        let ctx = ctx(&[], &[]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &ctx);
        assert_eq!(scorer.speaker_boost(&record("", "", "Meher Baba")), 0.05);
        assert_eq!(scorer.speaker_boost(&record("", "", "meher baba")), 0.0);
        assert_eq!(scorer.speaker_boost(&record("", "", "Eruch")), 0.0);
    }

    #[test]
    fn test_monotonic_in_vector_score() {
        let ctx = ctx(&["Suffering"], &["pain"]);
        let scorer = QueryScorer::new(ScoringWeights::default(), "Meher Baba", &ctx);
        let r = record("pain", "Suffering", "Meher Baba");

        let mut previous = f32::NEG_INFINITY;
        for step in -10..=10 {
            let s = scorer.score(&r, step as f32 / 10.0).final_score;
            assert!(s >= previous);
            previous = s;
        }
    }

    #[test]
    fn test_custom_weights() {
        let weights = ScoringWeights {
            vector_weight: 1.0,
            topic_boost: 0.0,
            keyword_boost: 0.0,
            keyword_boost_cap: 0.0,
            speaker_boost: 0.0,
        };
        let ctx = ctx(&["Suffering"], &["pain"]);
        let scorer = QueryScorer::new(weights, "Meher Baba", &ctx);
        let s = scorer.score(&record("pain", "Suffering", "Meher Baba"), 0.42);
        assert_eq!(s.final_score, 0.42);
    }
}
