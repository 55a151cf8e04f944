//! Book router
//!
//! Asks the generative backend which book answers a question and which
//! topic tags and keywords to search with.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use claritas_core::RoutingDecision;

use crate::backend::LlmBackend;
use crate::prompt::{router_user_prompt, Message, ROUTER_SYSTEM_PROMPT};
use crate::LlmError;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```").unwrap());

/// Parse router output into a decision.
///
/// Tolerates a surrounding Markdown code fence and prose before or after
/// the JSON object. Fields that are missing decode to empty values.
pub fn parse_routing(raw: &str) -> Result<RoutingDecision, LlmError> {
    let body = CODE_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    let object = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(LlmError::UnparseableOutput {
                raw: raw.to_string(),
            })
        },
    };

    serde_json::from_str(object).map_err(|e| {
        tracing::debug!(error = %e, "Router output is not a valid decision");
        LlmError::UnparseableOutput {
            raw: raw.to_string(),
        }
    })
}

pub struct BookRouter {
    backend: Arc<dyn LlmBackend>,
    temperature: f32,
}

impl BookRouter {
    pub fn new(backend: Arc<dyn LlmBackend>, temperature: f32) -> Self {
        Self {
            backend,
            temperature,
        }
    }

    /// Route a question to a book.
    ///
    /// Backend failures propagate as-is; a reply that is not a decision is
    /// [`LlmError::UnparseableOutput`] carrying the raw reply.
    pub async fn route(&self, question: &str) -> Result<RoutingDecision, LlmError> {
        let messages = [
            Message::system(ROUTER_SYSTEM_PROMPT),
            Message::user(router_user_prompt(question)),
        ];

        let result = self.backend.generate(&messages, self.temperature).await?;
        tracing::debug!(
            model = %result.model,
            elapsed_ms = result.total_time_ms,
            raw = %result.text,
            "Router replied"
        );

        let decision = parse_routing(&result.text)?;
        tracing::info!(
            book = %decision.book,
            topics = ?decision.topics,
            keywords = ?decision.keywords,
            "Question routed"
        );
        Ok(decision)
    }
}
