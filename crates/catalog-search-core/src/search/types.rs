use crate::config::{
    EngineConfig, DEFAULT_KEYWORD_WEIGHT, DEFAULT_MIN_SCORE, DEFAULT_SEMANTIC_WEIGHT,
    DEFAULT_TOP_K, MAX_MIN_SCORE, MAX_TOP_K, MIN_TOP_K,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique document identifier.
///
/// Opaque to the engine: it is whatever key the document store uses.
/// Ordering is lexicographic and is the tie-breaker for every ranked list.
///
/// # Examples
///
/// ```
/// use catalog_search_core::search::DocId;
///
/// let a = DocId::from("1");
/// let b = DocId::new("2");
/// assert!(a < b);
/// assert_eq!(a.as_str(), "1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Wraps a store identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Catalog item as supplied by the document store.
///
/// Only `title`, `category` and `description` are read by the engine; every
/// other field (price, unit, supplier, ...) is carried through untouched in
/// `attributes` and returned with search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store identifier
    pub id: DocId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Category label
    #[serde(default)]
    pub category: String,
    /// Opaque display fields passed through unmodified
    #[serde(default, flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Creates a document with no extra attributes.
    pub fn new(
        id: impl Into<DocId>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            attributes: serde_json::Map::new(),
        }
    }

    /// Adds an opaque display attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Text that is encoded and tokenized for this document.
    ///
    /// `title category description`, skipping empty fields.
    ///
    /// ```
    /// use catalog_search_core::search::Document;
    ///
    /// let doc = Document::new("7", "Portland Cement", "Type I", "Cement");
    /// assert_eq!(doc.index_text(), "Portland Cement Cement Type I");
    /// ```
    pub fn index_text(&self) -> String {
        [
            self.title.as_str(),
            self.category.as_str(),
            self.description.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Parameters of a hybrid query.
///
/// Values are validated, never clamped: an out-of-range field fails the whole
/// request with [`SearchError::Validation`] before any index work runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of results (1..=50)
    pub top_k: usize,
    /// Results with a combined score below this are dropped (0.0..=2.0)
    pub min_score: f32,
    /// Weight of the normalized semantic score (0.0..=1.0)
    pub semantic_weight: f32,
    /// Weight of the normalized keyword score (0.0..=1.0)
    pub keyword_weight: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            keyword_weight: DEFAULT_KEYWORD_WEIGHT,
        }
    }
}

impl SearchParams {
    /// Creates parameters from explicit values.
    pub fn new(top_k: usize, min_score: f32, semantic_weight: f32, keyword_weight: f32) -> Self {
        Self {
            top_k,
            min_score,
            semantic_weight,
            keyword_weight,
        }
    }

    /// Defaults taken from an [`EngineConfig`].
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            top_k: config.default_top_k,
            min_score: config.default_min_score,
            semantic_weight: config.default_semantic_weight,
            keyword_weight: config.default_keyword_weight,
        }
    }

    /// Checks every field against its declared bounds.
    pub fn validate(&self) -> Result<(), SearchError> {
        validate_top_k(self.top_k)?;
        validate_min_score(self.min_score)?;
        validate_weight("semantic_weight", self.semantic_weight)?;
        validate_weight("keyword_weight", self.keyword_weight)?;
        Ok(())
    }
}

pub(crate) fn validate_top_k(top_k: usize) -> Result<(), SearchError> {
    if (MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
        Ok(())
    } else {
        Err(SearchError::Validation(format!(
            "top_k must be between {} and {}, got {}",
            MIN_TOP_K, MAX_TOP_K, top_k
        )))
    }
}

pub(crate) fn validate_min_score(min_score: f32) -> Result<(), SearchError> {
    if (0.0..=MAX_MIN_SCORE).contains(&min_score) {
        Ok(())
    } else {
        Err(SearchError::Validation(format!(
            "min_score must be between 0 and {}, got {}",
            MAX_MIN_SCORE, min_score
        )))
    }
}

fn validate_weight(name: &str, weight: f32) -> Result<(), SearchError> {
    // NaN fails the range check
    if (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(SearchError::Validation(format!(
            "{} must be between 0 and 1, got {}",
            name, weight
        )))
    }
}

/// Search result with relevance scores.
///
/// Raw scores are what each index produced for this document (0.0 when the
/// document was not matched by that signal). Normalized scores are the
/// min-max values over the current result set that fed `combined_score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Document identifier
    pub doc_id: DocId,
    /// The matched document
    pub document: Document,
    /// Raw cosine similarity
    pub semantic_score: f32,
    /// Raw BM25 score
    pub keyword_score: f32,
    /// Semantic score after min-max normalization
    pub semantic_normalized: f32,
    /// Keyword score after min-max normalization
    pub keyword_normalized: f32,
    /// `semantic_weight * semantic_normalized + keyword_weight * keyword_normalized`
    pub combined_score: f32,
}

/// Snapshot statistics about the installed index pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of documents in both indexes
    pub documents_indexed: usize,
    /// Version tag of the encoder that produced the vectors
    pub encoder_version: String,
    /// Vector dimension
    pub dimension: usize,
    /// Distinct terms in the keyword index
    pub vocabulary_size: usize,
    /// Average token count per document
    pub avg_doc_length: f64,
    /// Install counter, incremented on every swap
    pub generation: u64,
    /// Whether the installed pair came from the cache or a build
    pub origin: IndexOrigin,
}

/// Where the installed index pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrigin {
    /// Built from a full corpus snapshot
    Built,
    /// Loaded from the persisted cache
    Cache,
}

/// Outcome of a full rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildSummary {
    /// Number of documents in the new index pair
    pub documents_indexed: usize,
}

/// Error types for search operations.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// Query text is empty or could not be encoded
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Request parameter outside its declared bounds
    #[error("Validation error: {0}")]
    Validation(String),
    /// Document store has no document with this id
    #[error("Document not found: {0}")]
    DocumentNotFound(DocId),
    /// Encoder could not be reached at startup
    #[error("Encoder unavailable: {0}")]
    EncoderUnavailable(String),
    /// Vector dimension mismatch (expected vs actual)
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension
        expected: usize,
        /// Actual embedding dimension received
        actual: usize,
    },
    /// Document store or blob storage error
    #[error("Storage error: {0}")]
    Storage(String),
    /// Cache could not be written
    #[error("Cache error: {0}")]
    Cache(String),
    /// Index construction error
    #[error("Index error: {0}")]
    Index(String),
}

/// Validates that an embedding has the expected dimension.
///
/// # Examples
///
/// ```
/// use catalog_search_core::search::{validate_dimension, SearchError};
///
/// assert!(validate_dimension(3, 3).is_ok());
/// assert!(matches!(
///     validate_dimension(5, 3),
///     Err(SearchError::DimensionMismatch { expected: 5, actual: 3 })
/// ));
/// ```
pub fn validate_dimension(expected: usize, actual: usize) -> Result<(), SearchError> {
    if actual == expected {
        Ok(())
    } else {
        Err(SearchError::DimensionMismatch { expected, actual })
    }
}
