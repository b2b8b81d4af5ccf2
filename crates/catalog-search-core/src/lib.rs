//! # Catalog Search Core
//!
//! Hybrid retrieval engine for product catalogs: dense semantic similarity
//! and BM25 lexical matching, fused by weighted min-max normalized scores.
//!
//! The engine keeps both indexes in one immutable [`IndexPair`](search::IndexPair)
//! that is swapped atomically on rebuild or single-document update, so
//! concurrent queries always see a consistent state.
//!
//! ## Modules
//!
//! - [`search`] - Indexes, fusion and the [`HybridSearchEngine`](search::HybridSearchEngine)
//! - [`storage`] - Document store trait, blob storage and the index cache
//! - [`embedding`] - Text encoder trait and the feature-hashing encoder
//! - [`config`] - Ranking constants, request bounds and engine settings
//! - [`error`] - Encoder error types

pub mod config;
pub mod embedding;
pub mod error;
pub mod search;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;
