//! Per-request query context and the router's decision

use serde::{Deserialize, Serialize};

/// Structured decision produced by the router collaborator.
///
/// Treated as untrusted input: every field may be missing or bogus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    #[serde(default)]
    pub book: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Everything the ranker needs to know about one request.
///
/// Created at request entry, consumed once by the ranker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    /// Raw question text, never rewritten
    pub question: String,
    /// Target book name (resolved to a collection by the ranker)
    pub book: String,
    pub topics: Vec<String>,
    pub keywords: Vec<String>,
}

impl QueryContext {
    pub fn new(question: impl Into<String>, book: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            book: book.into(),
            topics: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Build a context from the raw question and a routing decision
    pub fn from_decision(question: impl Into<String>, decision: RoutingDecision) -> Self {
        Self {
            question: question.into(),
            book: decision.book,
            topics: decision.topics,
            keywords: decision.keywords,
        }
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Text used for embedding only.
    ///
    /// Topics then keywords are appended to the question, space-joined.
    /// Tags are used as given; empty ones are skipped. With no tags this is
    /// the question itself.
    pub fn enriched_query(&self) -> String {
        let tags: Vec<&str> = self
            .topics
            .iter()
            .chain(self.keywords.iter())
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .collect();

        if tags.is_empty() {
            return self.question.clone();
        }

        let mut enriched = self.question.clone();
        for tag in tags {
            enriched.push(' ');
            enriched.push_str(tag);
        }
        enriched
    }

    /// Lowercased whitespace-split terms of the raw question
    pub fn lexical_terms(&self) -> Vec<String> {
        self.question
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}
