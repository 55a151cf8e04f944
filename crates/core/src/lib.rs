//! Core traits and types for Claritas
//!
//! This crate provides foundational types used across all other crates:
//! - Passage records and the raw payload maps they are decoded from
//! - Per-request query context and the router's decision
//! - Collaborator traits for embedding and vector search
//! - The shared error type

pub mod error;
pub mod passage;
pub mod query;
pub mod traits;

pub use error::{Error, Result};
pub use passage::{Payload, PassageRecord, ScoredPayload};
pub use query::{QueryContext, RoutingDecision};
pub use traits::{Embedder, VectorStoreAdapter};
