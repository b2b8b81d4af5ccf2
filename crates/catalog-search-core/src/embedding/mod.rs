//! Text encoder abstractions and implementations.
//!
//! ## Core Traits
//!
//! - [`TextEncoder`] - text → dense vector, plus a version tag and dimension
//!
//! ## Implementations
//!
//! - [`HashingEncoder`] - deterministic feature-hashing encoder (no model files)
//!
//! ## Example
//!
//! ```
//! use catalog_search_core::embedding::{HashingEncoder, TextEncoder};
//!
//! let encoder = HashingEncoder::default();
//! let embedding = encoder.encode("galvanized steel rods").unwrap();
//! assert_eq!(embedding.len(), encoder.embedding_dim());
//! ```

mod traits;

pub mod hashing;

pub use hashing::{HashingEncoder, DEFAULT_HASHING_DIM};
pub use traits::TextEncoder;
