//! Hybrid search engine combining vector and keyword search.
//!
//! This module implements a hybrid retrieval system that combines:
//! - **Vector search** (semantic similarity, exact cosine scan)
//! - **Keyword search** (lexical matching via BM25)
//! - **Weighted fusion** of min-max normalized scores
//!
//! # Architecture
//!
//! - `types`: Core types (DocId, Document, SearchParams, SearchResult, SearchError)
//! - `tokenizer`: Lexical tokenization shared by BM25 and the hashing encoder
//! - `vector`: Exact cosine-similarity index
//! - `keyword`: BM25 inverted index with exact incremental statistics
//! - `fusion`: Score normalization and weighted combination
//! - `index`: `IndexPair`, the unit of searchable state
//! - `engine`: `HybridSearchEngine`, index builder and incremental updater
//!
//! # Algorithm Details
//!
//! **Vector Search**:
//! - Cosine similarity against every stored vector, O(n·d)
//! - Only strictly positive similarities count as semantic matches
//!
//! **Keyword Search (BM25)**:
//! - Term frequency / inverse document frequency scoring
//! - Parameters: k1=1.5, b=0.75
//!
//! **Weighted Fusion**:
//! - Union of both match sets; a missing signal scores at that signal's floor
//! - Each signal min-max normalized over the current result set
//! - `combined = semantic_weight·semantic + keyword_weight·keyword`
//! - Threshold on `min_score`, sort by combined then id, truncate to `top_k`

pub mod engine;
pub mod fusion;
pub mod index;
pub mod keyword;
pub mod tokenizer;
pub mod types;
pub mod vector;

pub use engine::HybridSearchEngine;
pub use index::IndexPair;
pub use types::{
    validate_dimension, DocId, Document, IndexOrigin, IndexStats, RebuildSummary, SearchError,
    SearchParams, SearchResult,
};
