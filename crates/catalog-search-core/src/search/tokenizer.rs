//! Lexical tokenization shared by the keyword index and the hashing encoder.
//!
//! The contract is deliberately small so it can be tested directly:
//!
//! 1. Lowercase the input.
//! 2. Split on every character that is not alphanumeric.
//! 3. Drop tokens shorter than [`MIN_TOKEN_LEN`] characters.
//! 4. Optionally drop common English stopwords.
//!
//! No stemming is applied.

use crate::config::MIN_TOKEN_LEN;
use serde::{Deserialize, Serialize};

/// Common English stopwords removed when [`Tokenizer::remove_stopwords`] is set.
pub const STOPWORDS: &[&str] = &[
    "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

/// Tokenizer settings.
///
/// Stored inside the keyword index so queries are always tokenized the same
/// way as the documents they are matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenizer {
    /// Drop [`STOPWORDS`] after splitting.
    pub remove_stopwords: bool,
}

impl Tokenizer {
    /// Tokenizer with stopword removal enabled or disabled.
    pub fn new(remove_stopwords: bool) -> Self {
        Self { remove_stopwords }
    }

    /// Splits `text` into normalized terms, preserving order and repeats.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .filter(|t| !self.remove_stopwords || !STOPWORDS.contains(&t.as_str()))
            .collect()
    }
}

/// Lowercases, splits on non-alphanumeric boundaries and drops short tokens.
///
/// # Examples
///
/// ```
/// use catalog_search_core::search::tokenizer::tokenize;
///
/// assert_eq!(
///     tokenize("Portland Cement, Type I"),
///     vec!["portland", "cement", "type"]
/// );
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}
