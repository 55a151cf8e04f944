//! Core traits for the retrieval pipeline
//!
//! External collaborators implement these traits so the ranker can:
//! - Swap providers without code changes
//! - Be tested against in-memory fakes
//!
//! # Trait Hierarchy
//!
//! ```text
//! Embedding:
//!   - Embedder: Text → fixed-length dense vector
//!
//! Vector Search:
//!   - VectorStoreAdapter: nearest-neighbour query + bounded payload scan
//! ```

mod embedding;
mod vector_store;

pub use embedding::Embedder;
pub use vector_store::VectorStoreAdapter;
