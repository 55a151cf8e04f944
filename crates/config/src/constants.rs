//! Centralized constants
//!
//! Single source of truth for default endpoints, timeouts and the reference
//! ranking weights. Settings defaults and crate-level `Default` impls read
//! from here so the numbers never drift apart.

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Ollama endpoint (chat and embeddings)
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// Qdrant gRPC endpoint
    pub const QDRANT_DEFAULT: &str = "http://localhost:6334";

    /// OpenAI API endpoint
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";

    /// Gemini API endpoint
    pub const GEMINI_DEFAULT: &str = "https://generativelanguage.googleapis.com";
}

/// Model names
pub mod models {
    pub const OPENAI_EMBEDDING: &str = "text-embedding-3-large";
    pub const OLLAMA_EMBEDDING: &str = "nomic-embed-text";
    pub const OLLAMA_CHAT: &str = "mistral-ctx:latest";
    pub const GEMINI_CHAT: &str = "models/gemini-2.0-flash";
}

/// Timeouts (milliseconds)
pub mod timeouts {
    /// Vector store query/scan
    pub const VECTOR_QUERY_MS: u64 = 10_000;

    /// Embedding request
    pub const EMBEDDING_MS: u64 = 30_000;

    /// LLM connection establishment
    pub const LLM_CONNECT_MS: u64 = 5_000;

    /// Full LLM request (local models can be slow)
    pub const LLM_REQUEST_MS: u64 = 180_000;
}

/// Retrieval defaults
pub mod rag {
    /// Passages returned per question
    pub const DEFAULT_TOP_K: usize = 1;

    /// Minimum similarity for a vector candidate
    pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.2;

    /// Candidates fetched per requested result
    pub const CANDIDATE_MULTIPLIER: usize = 3;

    /// Records read by the lexical fallback scan
    pub const FALLBACK_SCAN_LIMIT: usize = 300;

    /// Canonical primary-author label
    pub const PRIMARY_SPEAKER: &str = "Meher Baba";

    /// Books and their collections
    pub const COLLECTIONS: &[(&str, &str)] = &[
        ("God Speaks", "god_speaks_collection"),
        ("Life Eternal", "life_eternal_collection"),
    ];
}

/// Reference ranking weights
pub mod scoring {
    /// Multiplier applied to the raw vector similarity
    pub const VECTOR_WEIGHT: f32 = 0.8;

    /// Flat boost when any router topic matches the passage topic
    pub const TOPIC_BOOST: f32 = 0.10;

    /// Boost per router keyword found in the passage text
    pub const KEYWORD_BOOST: f32 = 0.05;

    /// Upper bound on the summed keyword boost
    pub const KEYWORD_BOOST_CAP: f32 = 0.15;

    /// Boost for passages spoken by the primary author
    pub const SPEAKER_BOOST: f32 = 0.05;
}

/// Answer generation
pub mod answers {
    /// Returned whenever no grounded answer can be produced
    pub const NO_DIRECT_SOURCE: &str = "Meher Baba has not spoken directly on this question.";

    /// Returned when quotes were found but the backend produced no answer
    pub const NO_DIRECT_SOURCE_IN_TEXTS: &str =
        "Meher Baba has not spoken directly on this question in the available authoritative texts.";

    /// Quotes placed into the generation prompt
    pub const MAX_QUOTES: usize = 6;
}
