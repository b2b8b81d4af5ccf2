// Exact cosine-similarity vector index

use super::fusion::sort_ranked;
use super::types::{validate_dimension, DocId, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::instrument;

/// Cosine similarity between two equal-length vectors.
///
/// Returns 0.0 when either vector has zero magnitude, so an empty document
/// never looks similar (or dissimilar) to anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

/// Vector index answering nearest-by-cosine queries with an exact scan.
///
/// Every query is compared against every stored vector, O(n·d). Catalogs are
/// thousands of items, not millions, so there is no approximate structure to
/// keep consistent with the keyword index.
///
/// All vectors share the dimension given at construction; upserts and queries
/// with another length fail with [`SearchError::DimensionMismatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    dimension: usize,
    vectors: BTreeMap<DocId, Vec<f32>>,
}

impl VectorIndex {
    /// Creates an empty index for `dimension`-sized vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: BTreeMap::new(),
        }
    }

    /// Vector dimension accepted by this index.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Inserts or replaces the vector for `id`.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::DimensionMismatch` if the vector has the wrong length.
    pub fn upsert(&mut self, id: DocId, vector: Vec<f32>) -> Result<(), SearchError> {
        validate_dimension(self.dimension, vector.len())?;
        self.vectors.insert(id, vector);
        Ok(())
    }

    /// Removes the vector for `id`. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &DocId) -> bool {
        self.vectors.remove(id).is_some()
    }

    /// Scores stored vectors against `query`.
    ///
    /// # Arguments
    ///
    /// * `query` - Query embedding
    /// * `candidates` - Restrict scoring to these ids; `None` scores everything
    ///
    /// # Returns
    ///
    /// `(DocId, cosine)` pairs sorted by similarity descending, ties by
    /// ascending id. Similarities are in [-1, 1].
    #[instrument(skip_all, fields(index_size = self.vectors.len()))]
    pub fn search(
        &self,
        query: &[f32],
        candidates: Option<&BTreeSet<DocId>>,
    ) -> Result<Vec<(DocId, f32)>, SearchError> {
        validate_dimension(self.dimension, query.len())?;

        let mut results: Vec<(DocId, f32)> = match candidates {
            Some(ids) => ids
                .iter()
                .filter_map(|id| {
                    self.vectors
                        .get(id)
                        .map(|v| (id.clone(), cosine_similarity(query, v)))
                })
                .collect(),
            None => self
                .vectors
                .iter()
                .map(|(id, v)| (id.clone(), cosine_similarity(query, v)))
                .collect(),
        };

        sort_ranked(&mut results);
        Ok(results)
    }

    /// Stored vector for `id`, if any.
    pub fn get(&self, id: &DocId) -> Option<&[f32]> {
        self.vectors.get(id).map(Vec::as_slice)
    }

    /// Returns true if `id` has a vector.
    pub fn contains(&self, id: &DocId) -> bool {
        self.vectors.contains_key(id)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Identifiers of all stored vectors.
    pub fn ids(&self) -> BTreeSet<DocId> {
        self.vectors.keys().cloned().collect()
    }

    /// Verifies that every stored vector has the index dimension.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::DimensionMismatch` for the first vector that does not.
    pub fn check_dimensions(&self) -> Result<(), SearchError> {
        self.vectors
            .values()
            .try_for_each(|vector| validate_dimension(self.dimension, vector.len()))
    }
}
