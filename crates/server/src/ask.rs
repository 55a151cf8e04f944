//! `POST /ask`
//!
//! route → retrieve → generate. The question may arrive as a JSON body
//! `{ "question": ... }` or as a `?question=` query parameter.

use std::time::Instant;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use claritas_config::constants::answers;
use claritas_core::QueryContext;
use claritas_llm::LlmError;
use claritas_rag::RetrievalMode;

use crate::metrics::{
    record_fallback, record_latency, record_request, GENERATION_LATENCY_MS, REQUEST_LATENCY_MS,
    RETRIEVAL_LATENCY_MS,
};
use crate::state::AppState;
use crate::ServerError;

const ROUTER_INVALID_JSON: &str = "Router did not return valid JSON";

#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AskResponse {
    Answer {
        book_used: String,
        answer: String,
    },
    /// Router replied with something that is not a decision
    RouterFailure {
        error: String,
        raw_router_output: String,
    },
}

pub async fn ask(
    State(state): State<AppState>,
    Query(params): Query<AskRequest>,
    body: Option<Json<AskRequest>>,
) -> Result<Json<AskResponse>, ServerError> {
    record_request("ask");
    let start = Instant::now();

    let question = body
        .and_then(|Json(b)| b.question)
        .or(params.question)
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ServerError::InvalidRequest("question is required".to_string()))?;

    let span = tracing::info_span!("ask", request_id = %Uuid::new_v4());
    let result = answer(&state, question).instrument(span).await;

    record_latency(REQUEST_LATENCY_MS, start.elapsed().as_secs_f64() * 1000.0);
    result.map(Json)
}

async fn answer(state: &AppState, question: String) -> Result<AskResponse, ServerError> {
    tracing::info!(question = %question, "Question received");

    let decision = match state.router.route(&question).await {
        Ok(decision) => decision,
        Err(LlmError::UnparseableOutput { raw }) => {
            tracing::warn!(raw = %raw, "Router did not return valid JSON");
            crate::metrics::record_error("router_invalid_json");
            return Ok(AskResponse::RouterFailure {
                error: ROUTER_INVALID_JSON.to_string(),
                raw_router_output: raw,
            });
        },
        Err(e) => return Err(ServerError::Unavailable(format!("Router: {}", e))),
    };

    let ctx = QueryContext::from_decision(question, decision);
    let book = ctx.book.clone();

    let retrieval_start = Instant::now();
    let retrieval = state
        .retriever
        .retrieve_detailed(&ctx, state.config.rag.top_k, state.config.rag.score_threshold)
        .await?;
    record_latency(
        RETRIEVAL_LATENCY_MS,
        retrieval_start.elapsed().as_secs_f64() * 1000.0,
    );
    if retrieval.mode == RetrievalMode::Fallback {
        record_fallback();
    }

    tracing::info!(
        book = %book,
        mode = retrieval.mode.as_str(),
        passages = retrieval.passages.len(),
        chunk_ids = ?retrieval.passages.iter().map(|p| p.chunk_id.as_str()).collect::<Vec<_>>(),
        "Retrieval complete"
    );

    if retrieval.passages.is_empty() {
        return Ok(AskResponse::Answer {
            book_used: book,
            answer: answers::NO_DIRECT_SOURCE.to_string(),
        });
    }

    let generation_start = Instant::now();
    let answer = state
        .generator
        .generate(&ctx.question, &retrieval.passages)
        .await;
    record_latency(
        GENERATION_LATENCY_MS,
        generation_start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(AskResponse::Answer {
        book_used: book,
        answer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shapes() {
        let answer = AskResponse::Answer {
            book_used: "Life Eternal".to_string(),
            answer: "text".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&answer).unwrap(),
            serde_json::json!({ "book_used": "Life Eternal", "answer": "text" })
        );

        let failure = AskResponse::RouterFailure {
            error: ROUTER_INVALID_JSON.to_string(),
            raw_router_output: "nope".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            serde_json::json!({
                "error": "Router did not return valid JSON",
                "raw_router_output": "nope"
            })
        );
    }
}
