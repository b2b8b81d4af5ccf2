//! Error types for catalog-search-core.
//!
//! Search, storage and cache errors live next to the code that raises them
//! (`search::types`, `storage`). This module holds the encoder errors shared
//! by every [`TextEncoder`](crate::embedding::TextEncoder) implementation.

use thiserror::Error;

/// Errors that can occur while turning text into a vector.
#[derive(Debug, Clone, Error)]
pub enum EncoderError {
    /// Model not available or initialization failed
    #[error("Encoder unavailable: {0}")]
    Unavailable(String),
    /// Input text had nothing to encode
    #[error("Empty input: {0}")]
    EmptyInput(String),
    /// Forward pass or hashing failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
