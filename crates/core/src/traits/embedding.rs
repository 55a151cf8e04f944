//! Embedding trait

use async_trait::async_trait;

use crate::Result;

/// Converts text into a dense vector.
///
/// Implementations must fail with [`crate::Error::Embedding`] when the
/// provider is unreachable or returns malformed output. Returning a zero
/// vector in place of an error is not allowed.
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimensionality, if known ahead of time
    fn dim(&self) -> Option<usize> {
        None
    }

    /// Provider/model name for logging
    fn name(&self) -> &str;
}
