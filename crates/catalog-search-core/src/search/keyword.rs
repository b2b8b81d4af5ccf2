//! BM25 keyword index for exact term matching.
//!
//! An inverted index from term to `{document → term frequency}`, plus the
//! per-document lengths and corpus totals BM25 needs. Unlike an append-only
//! BM25 corpus, every statistic here is maintained exactly under upsert and
//! remove, so an index mutated one document at a time scores identically to
//! one built from scratch over the same documents.
//!
//! # Algorithm
//!
//! ```text
//! score(q,d) = Σ_{t∈q} IDF(t) · tf(t,d)·(k1+1) / (tf(t,d) + k1·(1 - b + b·|d|/avgdl))
//! IDF(t)     = ln(1 + (N - df(t) + 0.5) / (df(t) + 0.5))
//! ```
//!
//! with `k1 = 1.5`, `b = 0.75` (see [`config`](crate::config)). `avgdl` is
//! always derived from the integer totals rather than stored, so it can never
//! disagree with `N`.
//!
//! # Usage
//!
//! ```
//! use catalog_search_core::search::keyword::KeywordIndex;
//! use catalog_search_core::search::DocId;
//!
//! let mut index = KeywordIndex::default();
//! index.upsert_text(DocId::from("1"), "portland cement foundation");
//! index.upsert_text(DocId::from("2"), "steel rods reinforcement");
//!
//! let results = index.search("cement");
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].0, DocId::from("1"));
//! ```

use super::fusion::sort_ranked;
use super::tokenizer::Tokenizer;
use super::types::{DocId, SearchError};
use crate::config::{BM25_B, BM25_K1};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::instrument;

/// BM25 inverted index.
///
/// # Thread Safety
///
/// Plain data with `&mut self` mutation. The engine shares it read-only
/// inside an [`IndexPair`](super::index::IndexPair) and mutates private
/// copies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordIndex {
    /// term → (document → term frequency)
    postings: BTreeMap<String, BTreeMap<DocId, u32>>,
    /// document → (term → term frequency), used to unwind a document on removal
    doc_terms: BTreeMap<DocId, BTreeMap<String, u32>>,
    /// document → token count
    doc_lengths: BTreeMap<DocId, u32>,
    /// Sum of all document lengths
    total_len: u64,
    tokenizer: Tokenizer,
}

impl KeywordIndex {
    /// Creates an empty index that tokenizes with `tokenizer`.
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            ..Self::default()
        }
    }

    /// Tokenizer used for documents and queries.
    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    /// Tokenizes `text` the way this index expects.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenizer.tokenize(text)
    }

    /// Inserts or replaces a document from already-tokenized terms.
    ///
    /// Replacing first unwinds the old entry, so `df`, `N` and the length
    /// totals are always consistent when this returns.
    ///
    /// # Arguments
    ///
    /// * `id` - Document identifier
    /// * `tokens` - Output of [`tokenize`](Self::tokenize) for the index text
    #[instrument(skip_all, fields(tokens = tokens.len()))]
    pub fn upsert(&mut self, id: DocId, tokens: &[String]) {
        self.remove(&id);

        let mut frequencies: BTreeMap<String, u32> = BTreeMap::new();
        for token in tokens {
            *frequencies.entry(token.clone()).or_insert(0) += 1;
        }

        for (term, tf) in &frequencies {
            self.postings
                .entry(term.clone())
                .or_default()
                .insert(id.clone(), *tf);
        }

        let length = tokens.len() as u32;
        self.total_len += u64::from(length);
        self.doc_lengths.insert(id.clone(), length);
        self.doc_terms.insert(id, frequencies);
    }

    /// Tokenizes `text` and upserts it.
    pub fn upsert_text(&mut self, id: DocId, text: &str) {
        let tokens = self.tokenize(text);
        self.upsert(id, &tokens);
    }

    /// Removes a document. Returns `false` if it was not indexed.
    pub fn remove(&mut self, id: &DocId) -> bool {
        let Some(terms) = self.doc_terms.remove(id) else {
            return false;
        };

        for term in terms.keys() {
            if let Some(docs) = self.postings.get_mut(term) {
                docs.remove(id);
                if docs.is_empty() {
                    self.postings.remove(term);
                }
            }
        }

        if let Some(length) = self.doc_lengths.remove(id) {
            self.total_len = self.total_len.saturating_sub(u64::from(length));
        }
        true
    }

    /// Scores every document matching at least one query term.
    ///
    /// Query terms count with multiplicity. Terms absent from the index
    /// contribute nothing; a query with no known terms yields an empty list.
    ///
    /// # Returns
    ///
    /// `(DocId, score)` pairs with strictly positive scores, sorted by score
    /// descending and then by ascending id.
    pub fn search(&self, query: &str) -> Vec<(DocId, f32)> {
        let n = self.doc_lengths.len();
        if n == 0 {
            return Vec::new();
        }

        let avgdl = self.avg_doc_length();
        let mut scores: HashMap<&DocId, f64> = HashMap::new();

        for term in self.tokenize(query) {
            let Some(docs) = self.postings.get(&term) else {
                continue;
            };
            let idf = idf(n, docs.len());

            for (id, tf) in docs {
                let length = self.doc_lengths.get(id).copied().unwrap_or(0);
                *scores.entry(id).or_insert(0.0) += idf * tf_component(*tf, length, avgdl);
            }
        }

        let mut results: Vec<(DocId, f32)> = scores
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .map(|(id, score)| (id.clone(), score as f32))
            .collect();
        sort_ranked(&mut results);
        results
    }

    /// Number of indexed documents (`N`).
    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Returns true if no documents are indexed.
    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    /// Returns true if `id` is indexed.
    pub fn contains(&self, id: &DocId) -> bool {
        self.doc_lengths.contains_key(id)
    }

    /// Average document length in tokens (0.0 for an empty index).
    pub fn avg_doc_length(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            0.0
        } else {
            self.total_len as f64 / self.doc_lengths.len() as f64
        }
    }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, BTreeMap::len)
    }

    /// Number of distinct terms.
    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Identifiers of all indexed documents.
    pub fn ids(&self) -> BTreeSet<DocId> {
        self.doc_lengths.keys().cloned().collect()
    }

    /// Verifies that the postings, lengths and totals all derive from the
    /// per-document term counts.
    ///
    /// Mutation keeps these in step; a deserialized index may not.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Index` describing the first disagreement.
    pub fn check_consistency(&self) -> Result<(), SearchError> {
        if self.doc_terms.len() != self.doc_lengths.len() {
            return Err(SearchError::Index(format!(
                "Keyword index has {} term maps but {} document lengths",
                self.doc_terms.len(),
                self.doc_lengths.len()
            )));
        }

        let mut expected_postings: BTreeMap<&str, BTreeMap<&DocId, u32>> = BTreeMap::new();
        let mut expected_total: u64 = 0;

        for (id, terms) in &self.doc_terms {
            let counted: u64 = terms.values().map(|tf| u64::from(*tf)).sum();
            let Some(length) = self.doc_lengths.get(id) else {
                return Err(SearchError::Index(format!(
                    "Keyword index has no length for document {}",
                    id
                )));
            };
            if terms.values().any(|tf| *tf == 0) || u64::from(*length) != counted {
                return Err(SearchError::Index(format!(
                    "Keyword index length {} for document {} disagrees with its {} term occurrences",
                    length, id, counted
                )));
            }
            expected_total += counted;

            for (term, tf) in terms {
                expected_postings
                    .entry(term.as_str())
                    .or_default()
                    .insert(id, *tf);
            }
        }

        if self.total_len != expected_total {
            return Err(SearchError::Index(format!(
                "Keyword index total length {} does not match document lengths summing to {}",
                self.total_len, expected_total
            )));
        }

        let postings_match = self.postings.len() == expected_postings.len()
            && self
                .postings
                .iter()
                .zip(&expected_postings)
                .all(|((term, docs), (expected_term, expected_docs))| {
                    term == expected_term
                        && docs.len() == expected_docs.len()
                        && docs
                            .iter()
                            .zip(expected_docs)
                            .all(|((id, tf), (expected_id, expected_tf))| {
                                id == *expected_id && tf == expected_tf
                            })
                });
        if !postings_match {
            return Err(SearchError::Index(
                "Keyword postings do not match per-document term counts".to_string(),
            ));
        }

        Ok(())
    }
}

fn idf(n: usize, df: usize) -> f64 {
    let n = n as f64;
    let df = df as f64;
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

fn tf_component(tf: u32, length: u32, avgdl: f64) -> f64 {
    let tf = f64::from(tf);
    let relative_len = if avgdl > 0.0 {
        f64::from(length) / avgdl
    } else {
        0.0
    };
    tf * (BM25_K1 + 1.0) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * relative_len))
}
