//! Feature-hashing text encoder.
//!
//! Maps every token (see [`tokenize`](crate::search::tokenizer::tokenize)) to
//! one of `dimension` buckets using xxHash64, with a hash-derived sign, and
//! L2-normalizes the result. Texts sharing vocabulary get positive cosine
//! similarity; texts with disjoint vocabulary are orthogonal up to hash
//! collisions.
//!
//! It needs no model files, which makes it the encoder of choice for tests,
//! the CLI and offline deployments. It is fully deterministic across runs and
//! platforms because the hash seed is fixed.

use super::TextEncoder;
use crate::error::EncoderError;
use crate::search::tokenizer::tokenize;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Default output dimension (matches common MiniLM-sized sentence models).
pub const DEFAULT_HASHING_DIM: usize = 384;

/// Seed for the token hash. Changing it changes every vector, so it is part
/// of the version tag.
const HASH_SEED: u64 = 0x6361_7461_6c6f_6721;

/// Deterministic bag-of-words encoder based on feature hashing.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimension: usize,
    version: String,
}

impl HashingEncoder {
    /// Creates an encoder producing `dimension`-sized vectors.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::InvalidConfig`] when `dimension` is zero.
    pub fn new(dimension: usize) -> Result<Self, EncoderError> {
        if dimension == 0 {
            return Err(EncoderError::InvalidConfig(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            version: format!("hashing-xxh64-{:x}-d{}", HASH_SEED, dimension),
        })
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = XxHash64::with_seed(HASH_SEED);
        hasher.write(token.as_bytes());
        let hash = hasher.finish();
        let index = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASHING_DIM,
            version: format!("hashing-xxh64-{:x}-d{}", HASH_SEED, DEFAULT_HASHING_DIM),
        }
    }
}

impl TextEncoder for HashingEncoder {
    fn version(&self) -> &str {
        &self.version
    }

    fn embedding_dim(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        if text.trim().is_empty() {
            return Err(EncoderError::EmptyInput(
                "Cannot encode blank text".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let (index, sign) = self.bucket(&token);
            vector[index] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        Ok(vector)
    }
}
