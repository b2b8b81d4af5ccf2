//! Single-document updates producing the next index pair.
//!
//! Both functions take the installed pair by reference and return a new one;
//! the installed pair is never modified, so readers holding it are unaffected
//! until the engine swaps the result in. Only the changed document is encoded
//! and tokenized.

use super::builder::embed_document;
use crate::embedding::TextEncoder;
use crate::search::index::IndexPair;
use crate::search::types::{DocId, Document};
use crate::search::SearchError;
use tracing::instrument;

/// Returns `pair` with `document` inserted or replaced.
///
/// Encoding happens before the copy is made, so an encoder failure costs
/// nothing and leaves no partial state.
#[instrument(skip_all, fields(doc_id = %document.id))]
pub fn upsert_one(
    pair: &IndexPair,
    document: Document,
    encoder: &dyn TextEncoder,
) -> Result<IndexPair, SearchError> {
    let text = document.index_text();
    let vector = embed_document(encoder, &document.id, &text)?;
    let tokens = pair.keyword().tokenize(&text);

    let mut next = pair.clone();
    next.upsert(document, vector, &tokens)?;
    Ok(next)
}

/// Returns `pair` without `id`, or `None` if `id` is not indexed.
#[instrument(skip_all, fields(doc_id = %id))]
pub fn remove_one(pair: &IndexPair, id: &DocId) -> Option<IndexPair> {
    if pair.document(id).is_none() {
        return None;
    }
    let mut next = pair.clone();
    next.remove(id);
    Some(next)
}
