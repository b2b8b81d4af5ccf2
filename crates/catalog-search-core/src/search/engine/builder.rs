//! Full index construction from a corpus snapshot.

use crate::embedding::TextEncoder;
use crate::error::EncoderError;
use crate::search::index::IndexPair;
use crate::search::tokenizer::Tokenizer;
use crate::search::types::{validate_dimension, DocId, Document, SearchError};
use instant::Instant;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Maps an encoder failure while indexing `id` to a search error.
pub(crate) fn encoder_failure(id: &DocId, err: EncoderError) -> SearchError {
    match err {
        EncoderError::Unavailable(msg) => SearchError::EncoderUnavailable(msg),
        other => SearchError::Index(format!("Failed to encode document {}: {}", id, other)),
    }
}

/// Embeds one document's index text.
///
/// A document with no text at all gets a zero vector, which has cosine 0.0
/// against every query, instead of being dropped from one index and not the
/// other.
pub(crate) fn embed_document(
    encoder: &dyn TextEncoder,
    id: &DocId,
    text: &str,
) -> Result<Vec<f32>, SearchError> {
    if text.trim().is_empty() {
        return Ok(vec![0.0; encoder.embedding_dim()]);
    }
    let vector = encoder.encode(text).map_err(|e| encoder_failure(id, e))?;
    validate_dimension(encoder.embedding_dim(), vector.len())?;
    Ok(vector)
}

/// Builds a brand-new index pair from `documents`.
///
/// Encoding and tokenization run on separate threads; both indexes are then
/// filled from the same document list so they always cover the same ids. If
/// `documents` repeats an id, the last occurrence wins.
///
/// Never touches a live pair; the caller installs the result.
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn build_index_pair(
    documents: Vec<Document>,
    encoder: &dyn TextEncoder,
    tokenizer: Tokenizer,
) -> Result<IndexPair, SearchError> {
    let total_start = Instant::now();
    let submitted = documents.len();

    let corpus: BTreeMap<DocId, Document> =
        documents.into_iter().map(|d| (d.id.clone(), d)).collect();
    if corpus.len() < submitted {
        warn!(
            "Corpus contained {} duplicate ids; keeping the last occurrence",
            submitted - corpus.len()
        );
    }

    let texts: Vec<(&DocId, String)> = corpus
        .iter()
        .map(|(id, doc)| (id, doc.index_text()))
        .collect();

    let (vectors, token_lists) = std::thread::scope(|s| {
        let encode_handle = s.spawn(|| {
            let start = Instant::now();
            let mut vectors = vec![Vec::new(); texts.len()];

            let (non_empty, empty): (Vec<usize>, Vec<usize>) =
                (0..texts.len()).partition(|&i| !texts[i].1.trim().is_empty());
            for i in empty {
                vectors[i] = vec![0.0; encoder.embedding_dim()];
            }

            let batch: Vec<&str> = non_empty.iter().map(|&i| texts[i].1.as_str()).collect();
            let encoded = encoder.encode_batch(&batch).map_err(|e| {
                let first = non_empty.first().map(|&i| texts[i].0.clone());
                match first {
                    Some(id) => encoder_failure(&id, e),
                    None => SearchError::Index(e.to_string()),
                }
            })?;
            if encoded.len() != non_empty.len() {
                return Err(SearchError::Index(format!(
                    "Encoder returned {} vectors for {} texts",
                    encoded.len(),
                    non_empty.len()
                )));
            }
            for (i, vector) in non_empty.into_iter().zip(encoded) {
                validate_dimension(encoder.embedding_dim(), vector.len())?;
                vectors[i] = vector;
            }

            let elapsed = start.elapsed();
            debug!(
                "Encoded {} documents in {:?} ({:.2}ms/doc)",
                texts.len(),
                elapsed,
                elapsed.as_secs_f64() * 1000.0 / texts.len().max(1) as f64
            );
            Ok(vectors)
        });

        let tokenize_handle = s.spawn(|| {
            let start = Instant::now();
            let tokens: Vec<Vec<String>> = texts
                .iter()
                .map(|(_, text)| tokenizer.tokenize(text))
                .collect();
            debug!(
                "Tokenized {} documents in {:?}",
                texts.len(),
                start.elapsed()
            );
            tokens
        });

        let vectors = encode_handle
            .join()
            .map_err(|_| SearchError::Index("Encoding thread panicked".to_string()))?;
        let tokens = tokenize_handle
            .join()
            .map_err(|_| SearchError::Index("Tokenizing thread panicked".to_string()))?;
        vectors.map(|v| (v, tokens))
    })?;
    drop(texts);

    let mut pair = IndexPair::empty(encoder.embedding_dim(), encoder.version(), tokenizer);
    for ((document, vector), tokens) in corpus.into_values().zip(vectors).zip(token_lists) {
        pair.upsert(document, vector, &tokens)?;
    }
    pair.check_parity()?;

    debug!(
        "Built index pair: {} documents, {} terms in {:?}",
        pair.len(),
        pair.keyword().vocabulary_size(),
        total_start.elapsed()
    );
    Ok(pair)
}
