//! Answer generation grounded in retrieved quotes
//!
//! Only passages attributed to the primary speaker reach the prompt. The
//! generator never fails a request: with no usable quotes, or when every
//! backend fails, it returns the fixed "not spoken directly" answer.

use std::sync::Arc;

use claritas_config::constants::{answers, rag};
use claritas_config::LlmSettings;
use claritas_core::PassageRecord;

use crate::backend::LlmBackend;
use crate::prompt::{explainer_prompt, Message, EXPLAINER_SYSTEM_PROMPT};

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub primary_speaker: String,
    pub max_quotes: usize,
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            primary_speaker: rag::PRIMARY_SPEAKER.to_string(),
            max_quotes: answers::MAX_QUOTES,
            temperature: 0.2,
        }
    }
}

impl GeneratorConfig {
    pub fn from_settings(llm: &LlmSettings, primary_speaker: &str) -> Self {
        Self {
            primary_speaker: primary_speaker.to_string(),
            max_quotes: llm.max_quotes,
            temperature: llm.explainer_temperature,
        }
    }
}

pub struct AnswerGenerator {
    backend: Arc<dyn LlmBackend>,
    config: GeneratorConfig,
}

impl AnswerGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>, config: GeneratorConfig) -> Self {
        Self { backend, config }
    }

    /// Passages eligible for quoting, capped at `max_quotes`
    pub fn quote_gate<'a>(&self, passages: &'a [PassageRecord]) -> Vec<&'a PassageRecord> {
        passages
            .iter()
            .filter(|p| p.speaker == self.config.primary_speaker && !p.text.trim().is_empty())
            .take(self.config.max_quotes)
            .collect()
    }

    /// Answer `question` using only the quotable passages
    pub async fn generate(&self, question: &str, passages: &[PassageRecord]) -> String {
        let quotes = self.quote_gate(passages);
        if quotes.is_empty() {
            tracing::info!(
                candidates = passages.len(),
                "No quotable passages, returning fixed answer"
            );
            return answers::NO_DIRECT_SOURCE.to_string();
        }

        let context = build_context(&quotes);
        let messages = [
            Message::system(EXPLAINER_SYSTEM_PROMPT),
            Message::user(explainer_prompt(&context, question, &self.config.primary_speaker)),
        ];

        match self.backend.generate(&messages, self.config.temperature).await {
            Ok(result) if !result.text.is_empty() => {
                tracing::debug!(
                    model = %result.model,
                    elapsed_ms = result.total_time_ms,
                    quotes = quotes.len(),
                    "Answer generated"
                );
                result.text
            },
            Ok(_) => {
                tracing::warn!("Answer generator returned empty text");
                answers::NO_DIRECT_SOURCE_IN_TEXTS.to_string()
            },
            Err(e) => {
                tracing::warn!(error = %e, "Answer generation failed");
                answers::NO_DIRECT_SOURCE_IN_TEXTS.to_string()
            },
        }
    }
}

/// Render quotes as labelled blocks separated by blank lines
pub fn build_context(quotes: &[&PassageRecord]) -> String {
    quotes
        .iter()
        .map(|q| {
            let source = if q.source.is_empty() {
                "Unknown source"
            } else {
                q.source.as_str()
            };
            format!(
                "QUOTE SOURCE: {}\nSPEAKER: {}\nTEXT:\n{}",
                source, q.speaker, q.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
