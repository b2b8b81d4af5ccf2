//! The index pair: one complete, self-consistent searchable state.
//!
//! An [`IndexPair`] bundles the vector index, the keyword index and the
//! documents they were built from, tagged with the encoder version that
//! produced the vectors. The engine only ever publishes whole pairs, so a
//! reader can never see one index updated without the other.
//!
//! Mutation is crate-private and only used on private copies
//! (see [`engine::incremental`](super::engine)).

use super::keyword::KeywordIndex;
use super::tokenizer::Tokenizer;
use super::types::{validate_dimension, DocId, Document, SearchError};
use super::vector::VectorIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vector index + keyword index + source documents, versioned by encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPair {
    vector: VectorIndex,
    keyword: KeywordIndex,
    documents: BTreeMap<DocId, Document>,
    encoder_version: String,
}

impl IndexPair {
    /// Creates an empty pair.
    pub fn empty(dimension: usize, encoder_version: impl Into<String>, tokenizer: Tokenizer) -> Self {
        Self {
            vector: VectorIndex::new(dimension),
            keyword: KeywordIndex::new(tokenizer),
            documents: BTreeMap::new(),
            encoder_version: encoder_version.into(),
        }
    }

    /// Dense index.
    pub fn vector(&self) -> &VectorIndex {
        &self.vector
    }

    /// BM25 index.
    pub fn keyword(&self) -> &KeywordIndex {
        &self.keyword
    }

    /// Indexed document by id.
    pub fn document(&self, id: &DocId) -> Option<&Document> {
        self.documents.get(id)
    }

    /// All indexed documents in ascending id order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Version tag of the encoder that produced the vectors.
    pub fn encoder_version(&self) -> &str {
        &self.encoder_version
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.vector.dimension()
    }

    /// Corpus size.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Verifies that both indexes and the document map cover the same ids.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Index` describing the first disagreement.
    pub fn check_parity(&self) -> Result<(), SearchError> {
        let vector_ids = self.vector.ids();
        let keyword_ids = self.keyword.ids();

        if vector_ids != keyword_ids {
            let only_vector = vector_ids.difference(&keyword_ids).count();
            let only_keyword = keyword_ids.difference(&vector_ids).count();
            return Err(SearchError::Index(format!(
                "Index parity violated: {} ids only in vector index, {} only in keyword index",
                only_vector, only_keyword
            )));
        }

        if self.documents.len() != vector_ids.len()
            || !self.documents.keys().all(|id| vector_ids.contains(id))
        {
            return Err(SearchError::Index(format!(
                "Document map ({} entries) does not match indexes ({} ids)",
                self.documents.len(),
                vector_ids.len()
            )));
        }

        Ok(())
    }

    /// Parity plus the internal consistency of each index.
    ///
    /// Run on pairs that did not come from this process's own mutations,
    /// such as a decoded cache blob.
    ///
    /// # Errors
    ///
    /// Returns the first `SearchError` found.
    pub fn check_integrity(&self) -> Result<(), SearchError> {
        self.check_parity()?;
        self.vector.check_dimensions()?;
        self.keyword.check_consistency()
    }

    /// Inserts or replaces one document in both indexes.
    ///
    /// The vector is validated before anything is touched, so an error
    /// leaves the pair unchanged.
    pub(crate) fn upsert(
        &mut self,
        document: Document,
        vector: Vec<f32>,
        tokens: &[String],
    ) -> Result<(), SearchError> {
        validate_dimension(self.vector.dimension(), vector.len())?;

        let id = document.id.clone();
        self.vector.upsert(id.clone(), vector)?;
        self.keyword.upsert(id.clone(), tokens);
        self.documents.insert(id, document);
        Ok(())
    }

    /// Removes one document from both indexes. Returns `false` if absent.
    pub(crate) fn remove(&mut self, id: &DocId) -> bool {
        let in_vector = self.vector.remove(id);
        let in_keyword = self.keyword.remove(id);
        let in_documents = self.documents.remove(id).is_some();
        in_vector || in_keyword || in_documents
    }
}
