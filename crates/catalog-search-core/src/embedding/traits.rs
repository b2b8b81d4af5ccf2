//! Traits for embedding operations.
//!
//! [`TextEncoder`] is the seam between the retrieval engine and whatever
//! model produces dense vectors. The engine only ever sees this trait, so a
//! sentence-transformer, a remote embedding service or the bundled
//! [`HashingEncoder`](super::HashingEncoder) can be swapped freely.

use crate::error::EncoderError;
use std::sync::Arc;

/// Turns text into a fixed-length dense vector.
///
/// # Contract
///
/// - `encode` is deterministic for a fixed [`version`](Self::version) and has
///   no side effects observable to the caller.
/// - Every returned vector has exactly [`embedding_dim`](Self::embedding_dim)
///   components.
/// - `version` changes whenever the produced vectors could change; it is
///   stored alongside persisted indexes to reject stale embeddings.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; queries encode concurrently.
///
/// # Examples
///
/// ```
/// use catalog_search_core::embedding::{HashingEncoder, TextEncoder};
///
/// let encoder = HashingEncoder::new(64).unwrap();
/// let v = encoder.encode("portland cement").unwrap();
/// assert_eq!(v.len(), encoder.embedding_dim());
/// ```
pub trait TextEncoder: Send + Sync {
    /// Version tag identifying the model and its configuration.
    fn version(&self) -> &str;

    /// Returns the embedding dimension (vector size).
    fn embedding_dim(&self) -> usize;

    /// Encodes one text.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::EmptyInput`] for blank text and
    /// [`EncoderError::Unavailable`] when the backing model cannot be reached.
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError>;

    /// Encodes several texts.
    ///
    /// The default implementation calls [`encode`](Self::encode) in order;
    /// model-backed encoders should override it with a batched forward pass.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncoderError> {
        texts.iter().map(|text| self.encode(text)).collect()
    }
}

impl<T: TextEncoder + ?Sized> TextEncoder for Arc<T> {
    fn version(&self) -> &str {
        (**self).version()
    }

    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        (**self).encode(text)
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncoderError> {
        (**self).encode_batch(texts)
    }
}
