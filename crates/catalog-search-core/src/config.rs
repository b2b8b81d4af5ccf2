//! Production configuration constants.
//!
//! This module contains the constants that define ranking behavior and
//! request bounds for the catalog search engine, plus [`EngineConfig`] for
//! the handful of settings a deployment may want to change.
//!
//! # Usage
//!
//! ```
//! use catalog_search_core::config::{BM25_B, BM25_K1, MAX_TOP_K};
//!
//! assert!(BM25_K1 > 0.0);
//! assert!((0.0..=1.0).contains(&BM25_B));
//! assert_eq!(MAX_TOP_K, 50);
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// BM25 Configuration
// =============================================================================

/// BM25 term frequency saturation parameter.
///
/// Higher values let repeated terms keep contributing for longer before the
/// score saturates.
pub const BM25_K1: f64 = 1.5;

/// BM25 document length normalization parameter.
///
/// 0.0 disables length normalization, 1.0 normalizes fully by `|d| / avgdl`.
pub const BM25_B: f64 = 0.75;

/// Tokens shorter than this many characters are dropped by the tokenizer.
pub const MIN_TOKEN_LEN: usize = 2;

// =============================================================================
// Request Bounds and Defaults
// =============================================================================

/// Smallest accepted `top_k`.
pub const MIN_TOP_K: usize = 1;

/// Largest accepted `top_k`.
pub const MAX_TOP_K: usize = 50;

/// Number of results returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 5;

/// Combined-score threshold applied when the caller does not supply one.
pub const DEFAULT_MIN_SCORE: f32 = 0.3;

/// Default weight of the normalized semantic score.
pub const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.6;

/// Default weight of the normalized keyword score.
pub const DEFAULT_KEYWORD_WEIGHT: f32 = 0.4;

/// Upper bound for `min_score`.
///
/// Both weights may be 1.0, so the combined score ranges over [0, 2].
pub const MAX_MIN_SCORE: f32 = 2.0;

// =============================================================================
// Persistence
// =============================================================================

/// Storage key under which the serialized index pair is kept.
pub const DEFAULT_CACHE_KEY: &str = "index/index_pair.json";

/// Runtime settings for a [`HybridSearchEngine`](crate::search::HybridSearchEngine).
///
/// Deserializable so front ends can load it from whatever config source they use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `top_k` used when a request leaves it unset.
    pub default_top_k: usize,
    /// `min_score` used when a request leaves it unset.
    pub default_min_score: f32,
    /// Semantic weight used when a request leaves it unset.
    pub default_semantic_weight: f32,
    /// Keyword weight used when a request leaves it unset.
    pub default_keyword_weight: f32,
    /// Drop common English stopwords during tokenization.
    ///
    /// Part of the index pair: changing it requires a rebuild.
    pub remove_stopwords: bool,
    /// Key used with the [`StorageBackend`](crate::storage::StorageBackend) cache.
    pub cache_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            default_min_score: DEFAULT_MIN_SCORE,
            default_semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            default_keyword_weight: DEFAULT_KEYWORD_WEIGHT,
            remove_stopwords: false,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let sum = DEFAULT_SEMANTIC_WEIGHT + DEFAULT_KEYWORD_WEIGHT;
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_top_k_within_bounds() {
        let k = DEFAULT_TOP_K;
        assert!(k >= MIN_TOP_K);
        assert!(k <= MAX_TOP_K);
    }

    #[test]
    fn test_engine_config_deserializes_partial() {
        let config: EngineConfig = serde_json::from_str(r#"{"remove_stopwords": true}"#).unwrap();
        assert!(config.remove_stopwords);
        assert_eq!(config.cache_key, DEFAULT_CACHE_KEY);
        assert_eq!(config.default_top_k, DEFAULT_TOP_K);
    }
}
