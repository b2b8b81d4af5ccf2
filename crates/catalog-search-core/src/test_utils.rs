//! Test utilities for catalog-search-core.
//!
//! Encoders with exactly predictable output and the small catalog used by the
//! ranking scenarios. Only compiled when running tests.

use crate::embedding::TextEncoder;
use crate::error::EncoderError;
use crate::search::tokenizer::tokenize;
use crate::search::types::Document;

/// Vocabulary of [`scenario_catalog`], one vector axis per word.
pub const SCENARIO_VOCABULARY: &[&str] = &[
    "portland",
    "cement",
    "type",
    "foundation",
    "steel",
    "rods",
    "reinforcement",
    "waterproof",
    "membrane",
    "roof",
];

/// Bag-of-words encoder with one axis per vocabulary word.
///
/// Unlike feature hashing there are no collisions: texts without a shared
/// vocabulary word have cosine similarity exactly 0.0.
pub struct VocabularyEncoder {
    vocabulary: Vec<String>,
    version: String,
}

impl VocabularyEncoder {
    pub fn new(words: &[&str]) -> Self {
        Self {
            vocabulary: words.iter().map(|w| w.to_string()).collect(),
            version: format!("vocabulary-v1-d{}", words.len()),
        }
    }

    pub fn scenario() -> Self {
        Self::new(SCENARIO_VOCABULARY)
    }
}

impl TextEncoder for VocabularyEncoder {
    fn version(&self) -> &str {
        &self.version
    }

    fn embedding_dim(&self) -> usize {
        self.vocabulary.len()
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        if text.trim().is_empty() {
            return Err(EncoderError::EmptyInput("blank".to_string()));
        }
        let mut vector = vec![0.0; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Some(i) = self.vocabulary.iter().position(|w| *w == token) {
                vector[i] += 1.0;
            }
        }
        Ok(vector)
    }
}

/// Encoder whose model is never reachable.
pub struct FailingEncoder;

impl TextEncoder for FailingEncoder {
    fn version(&self) -> &str {
        "failing-v1"
    }

    fn embedding_dim(&self) -> usize {
        4
    }

    fn encode(&self, _text: &str) -> Result<Vec<f32>, EncoderError> {
        Err(EncoderError::Unavailable("model not loaded".to_string()))
    }
}

/// The three-item catalog used by the ranking scenarios.
pub fn scenario_catalog() -> Vec<Document> {
    vec![
        Document::new("1", "Portland Cement Type I foundation", "", ""),
        Document::new("2", "steel rods reinforcement", "", ""),
        Document::new("3", "waterproof membrane roof", "", ""),
    ]
}
