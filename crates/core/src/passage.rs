//! Passage records
//!
//! A passage is the retrievable unit of quoted text. The vector store hands
//! back loosely typed payload maps; [`PassageRecord::from_payload`] is the
//! single place those are decoded.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Raw payload attached to a stored point
pub type Payload = HashMap<String, Value>;

/// Speaker label used when a payload carries no attribution
pub const UNKNOWN_SPEAKER: &str = "unknown";

/// A payload together with the adapter's native similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPayload {
    pub payload: Payload,
    pub score: f32,
}

impl ScoredPayload {
    pub fn new(payload: Payload, score: f32) -> Self {
        Self { payload, score }
    }
}

/// A stored, immutable passage of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageRecord {
    /// Opaque stable identifier
    pub chunk_id: String,
    /// Quoted content
    pub text: String,
    /// Attribution (a named author or "unknown")
    pub speaker: String,
    /// Book/chapter reference
    pub source: String,
    /// Single category label, may be empty
    pub topic: String,
}

impl PassageRecord {
    /// Decode a passage from a vector store payload.
    ///
    /// Missing fields decode to empty strings, except `speaker` which
    /// decodes to [`UNKNOWN_SPEAKER`]. Numeric ids are rendered as text.
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            chunk_id: field(payload, "chunk_id").unwrap_or_default(),
            text: field(payload, "text").unwrap_or_default(),
            speaker: field(payload, "speaker").unwrap_or_else(|| UNKNOWN_SPEAKER.to_string()),
            source: field(payload, "source").unwrap_or_default(),
            topic: field(payload, "topic").unwrap_or_default(),
        }
    }

    /// First `max_chars` characters of the text, for log previews
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

fn field(payload: &Payload, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
