//! End-to-end tests for the HTTP surface
//!
//! The router is driven with `oneshot` against in-memory LLM, embedder and
//! vector store fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use claritas_config::{constants::answers, Settings};
use claritas_core::{Embedder, Error, Payload, Result, ScoredPayload, VectorStoreAdapter};
use claritas_llm::{prompt::ROUTER_SYSTEM_PROMPT, GenerationResult, LlmBackend, LlmError, Message};
use claritas_server::{create_router, AppState};

/// Answers router prompts with `router_reply` and everything else with
/// `answer_reply`
struct FakeLlm {
    router_reply: std::result::Result<String, ()>,
    answer_reply: String,
    prompts: Mutex<Vec<String>>,
    availability_checks: AtomicUsize,
}

impl FakeLlm {
    fn new(router_reply: &str, answer_reply: &str) -> Arc<Self> {
        Arc::new(Self {
            router_reply: Ok(router_reply.to_string()),
            answer_reply: answer_reply.to_string(),
            prompts: Mutex::new(Vec::new()),
            availability_checks: AtomicUsize::new(0),
        })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self {
            router_reply: Err(()),
            answer_reply: String::new(),
            prompts: Mutex::new(Vec::new()),
            availability_checks: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmBackend for FakeLlm {
    async fn generate(
        &self,
        messages: &[Message],
        _temperature: f32,
    ) -> std::result::Result<GenerationResult, LlmError> {
        if let Some(last) = messages.last() {
            self.prompts.lock().push(last.content.clone());
        }
        let is_router = messages
            .first()
            .map(|m| m.content == ROUTER_SYSTEM_PROMPT)
            .unwrap_or(false);

        let text = if is_router {
            self.router_reply
                .clone()
                .map_err(|_| LlmError::Network("connection refused".to_string()))?
        } else {
            self.answer_reply.clone()
        };

        Ok(GenerationResult {
            text,
            total_time_ms: 1,
            model: "fake".to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        self.availability_checks.fetch_add(1, Ordering::SeqCst);
        self.router_reply.is_ok()
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

struct FakeEmbedder {
    fail: bool,
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(Error::Embedding("provider returned 500".to_string()));
        }
        Ok(vec![0.5, 0.5])
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeStore {
    query_result: Result<Vec<ScoredPayload>>,
    scan_result: Vec<Payload>,
    missing_collections: Vec<&'static str>,
}

#[async_trait]
impl VectorStoreAdapter for FakeStore {
    async fn query(
        &self,
        _collection: &str,
        _vector: Vec<f32>,
        _limit: usize,
        _score_threshold: f32,
    ) -> Result<Vec<ScoredPayload>> {
        self.query_result.clone()
    }

    async fn scan(&self, _collection: &str, limit: usize) -> Result<Vec<Payload>> {
        Ok(self.scan_result.iter().take(limit).cloned().collect())
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        Ok(!self.missing_collections.contains(&collection))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn payload(value: Value) -> Payload {
    serde_json::from_value(value).unwrap()
}

fn baba_passage() -> ScoredPayload {
    ScoredPayload::new(
        payload(json!({
            "chunk_id": "le-001",
            "text": "Love is the reflection of God's unity in the world of duality.",
            "speaker": "Meher Baba",
            "source": "Life Eternal, p. 12",
            "topic": "Love",
        })),
        0.7,
    )
}

const ROUTED_LIFE_ETERNAL: &str =
    r#"{"book": "Life Eternal", "topics": ["love"], "keywords": ["love"]}"#;

fn app_with(
    llm: Arc<FakeLlm>,
    embed_fails: bool,
    query_result: Result<Vec<ScoredPayload>>,
    scan_result: Vec<Payload>,
) -> Router {
    app_with_store(
        llm,
        embed_fails,
        FakeStore {
            query_result,
            scan_result,
            missing_collections: Vec::new(),
        },
    )
}

fn app_with_store(llm: Arc<FakeLlm>, embed_fails: bool, store: FakeStore) -> Router {
    let state = AppState::new(
        Settings::default(),
        llm,
        Arc::new(FakeEmbedder { fail: embed_fails }),
        Arc::new(store),
    );
    create_router(state)
}

fn default_app(llm: Arc<FakeLlm>) -> Router {
    app_with(llm, false, Ok(vec![baba_passage()]), Vec::new())
}

fn ask_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_ask_returns_grounded_answer() {
    let llm = FakeLlm::new(ROUTED_LIFE_ETERNAL, "Meher Baba says love reflects unity.");
    let app = default_app(llm.clone());

    let (status, body) = send(app, ask_request(json!({ "question": "What is love?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book_used"], "Life Eternal");
    assert_eq!(body["answer"], "Meher Baba says love reflects unity.");

    // The explainer prompt carries the retrieved passage verbatim
    let prompts = llm.prompts.lock();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Love is the reflection of God's unity in the world of duality."));
    assert!(prompts[1].contains("QUOTE SOURCE: Life Eternal, p. 12"));
}

#[tokio::test]
async fn test_ask_accepts_query_parameter() {
    let app = default_app(FakeLlm::new(ROUTED_LIFE_ETERNAL, "answer"));

    let request = Request::builder()
        .method("POST")
        .uri("/ask?question=What%20is%20love%3F")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "answer");
}

#[tokio::test]
async fn test_blank_question_is_rejected() {
    let llm = FakeLlm::new(ROUTED_LIFE_ETERNAL, "answer");
    let app = default_app(llm.clone());

    let (status, body) = send(app, ask_request(json!({ "question": "   " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(llm.prompts.lock().is_empty());
}

#[tokio::test]
async fn test_no_passages_returns_fixed_answer() {
    let llm = FakeLlm::new(ROUTED_LIFE_ETERNAL, "should not be used");
    let app = app_with(llm.clone(), false, Ok(Vec::new()), Vec::new());

    let (status, body) = send(app, ask_request(json!({ "question": "What is love?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book_used"], "Life Eternal");
    assert_eq!(body["answer"], answers::NO_DIRECT_SOURCE);
    // Only the router was consulted
    assert_eq!(llm.prompts.lock().len(), 1);
}

#[tokio::test]
async fn test_unknown_book_returns_fixed_answer() {
    let llm = FakeLlm::new(r#"{"book": "Discourses", "topics": [], "keywords": []}"#, "x");
    let app = default_app(llm);

    let (status, body) = send(app, ask_request(json!({ "question": "What is maya?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book_used"], "Discourses");
    assert_eq!(body["answer"], answers::NO_DIRECT_SOURCE);
}

#[tokio::test]
async fn test_router_invalid_json_reports_raw_output() {
    let app = default_app(FakeLlm::new("I think it is God Speaks.", "x"));

    let (status, body) = send(app, ask_request(json!({ "question": "What is maya?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Router did not return valid JSON");
    assert_eq!(body["raw_router_output"], "I think it is God Speaks.");
}

#[tokio::test]
async fn test_router_unreachable_is_service_unavailable() {
    let app = default_app(FakeLlm::down());

    let (status, body) = send(app, ask_request(json!({ "question": "What is maya?" }))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_embedding_failure_is_bad_gateway() {
    let llm = FakeLlm::new(ROUTED_LIFE_ETERNAL, "x");
    let app = app_with(llm, true, Ok(vec![baba_passage()]), Vec::new());

    let (status, _) = send(app, ask_request(json!({ "question": "What is love?" }))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_vector_store_outage_answers_from_lexical_fallback() {
    let llm = FakeLlm::new(ROUTED_LIFE_ETERNAL, "fallback answer");
    let records = vec![baba_passage().payload];
    let app = app_with(
        llm.clone(),
        false,
        Err(Error::VectorStore("connection refused".to_string())),
        records,
    );

    let (status, body) = send(app, ask_request(json!({ "question": "What is love?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "fallback answer");
    assert!(llm.prompts.lock()[1].contains("Love is the reflection"));
}

#[tokio::test]
async fn test_health() {
    let app = default_app(FakeLlm::new(ROUTED_LIFE_ETERNAL, "x"));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reflects_llm_availability() {
    let request = || Request::builder().uri("/ready").body(Body::empty()).unwrap();

    let (status, body) = send(default_app(FakeLlm::new(ROUTED_LIFE_ETERNAL, "x")), request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");

    let (status, body) = send(default_app(FakeLlm::down()), request()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["llm_backend"]["status"], "unreachable");
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = default_app(FakeLlm::new(ROUTED_LIFE_ETERNAL, "x"));

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_ready_reports_missing_collection() {
    let store = FakeStore {
        query_result: Ok(Vec::new()),
        scan_result: Vec::new(),
        missing_collections: vec!["god_speaks_collection"],
    };
    let app = app_with_store(FakeLlm::new(ROUTED_LIFE_ETERNAL, "x"), false, store);

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["llm_backend"]["status"], "ok");
    let collections = body["checks"]["collections"].as_array().unwrap();
    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0]["book"], "God Speaks");
    assert_eq!(collections[0]["status"], "missing");
    assert_eq!(collections[1]["book"], "Life Eternal");
    assert_eq!(collections[1]["status"], "ok");
}

#[tokio::test]
async fn test_router_generator_and_readiness_share_backend() {
    let llm = FakeLlm::new(ROUTED_LIFE_ETERNAL, "shared answer");
    let app = default_app(llm.clone());

    let (status, body) = send(
        app.clone(),
        ask_request(json!({ "question": "What is love?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "shared answer");

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);

    // Both prompts and the readiness check landed on the one injected backend
    let prompts = llm.prompts.lock();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].starts_with("User question:"));
    assert!(prompts[1].contains("USER QUESTION: What is love?"));
    assert_eq!(llm.availability_checks.load(Ordering::SeqCst), 1);
}
