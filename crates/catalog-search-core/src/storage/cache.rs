//! Index pair cache: serialize the live state and validate it on the way back.
//!
//! The blob is JSON holding a [`CacheManifest`] next to the
//! [`IndexPair`]. On load the manifest is checked first: a blob written by a
//! different encoder (or dimension, or an unreadable schema) is rejected with
//! [`CacheError::IncompatibleVersion`] instead of being trusted. Callers treat
//! every [`CacheError`] as a cache miss and rebuild.

use super::{StorageBackend, StorageError};
use crate::search::index::IndexPair;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Current schema version for the cache format.
///
/// Increment this when making breaking changes to the persistence format.
/// The version history:
/// - v1: Initial format (manifest + index pair in one JSON document)
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Errors from reading or writing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No blob stored under the key
    #[error("Cache missing")]
    Missing,
    /// Blob exists but cannot be decoded or is internally inconsistent
    #[error("Cache corrupt: {0}")]
    Corrupt(String),
    /// Blob was written by another encoder, dimension or schema
    #[error("Incompatible cache: {0}")]
    IncompatibleVersion(String),
    /// Storage backend failed
    #[error("Cache storage error: {0}")]
    Storage(String),
}

/// Header stored with every cached index pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheManifest {
    /// Schema version of this blob
    pub schema_version: u32,
    /// Minimum schema version required to read this blob
    pub min_compatible_version: u32,
    /// Encoder version tag the vectors were produced with
    pub encoder_version: String,
    /// Vector dimension
    pub dimension: usize,
    /// Number of documents in the pair
    pub document_count: usize,
    /// Unix timestamp (seconds) when the blob was written
    pub created_at: u64,
}

impl CacheManifest {
    fn for_pair(pair: &IndexPair) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            min_compatible_version: 1,
            encoder_version: pair.encoder_version().to_string(),
            dimension: pair.dimension(),
            document_count: pair.len(),
            created_at: current_timestamp(),
        }
    }

    /// Checks if this blob can be read by the current version.
    pub fn is_compatible(&self) -> bool {
        CURRENT_SCHEMA_VERSION >= self.min_compatible_version
    }
}

/// Returns the current Unix timestamp, or 0 if the clock is before the epoch.
fn current_timestamp() -> u64 {
    instant::SystemTime::now()
        .duration_since(instant::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Serialize)]
struct CacheBlobRef<'a> {
    manifest: CacheManifest,
    pair: &'a IndexPair,
}

#[derive(Deserialize)]
struct CacheHeader {
    manifest: CacheManifest,
}

#[derive(Deserialize)]
struct CacheBlob {
    manifest: CacheManifest,
    pair: IndexPair,
}

/// Serializes `pair` into a cache blob.
pub fn save(pair: &IndexPair) -> Result<Vec<u8>, CacheError> {
    let blob = CacheBlobRef {
        manifest: CacheManifest::for_pair(pair),
        pair,
    };
    serde_json::to_vec(&blob).map_err(|e| CacheError::Corrupt(e.to_string()))
}

/// Decodes a cache blob, accepting it only for the running encoder.
///
/// # Arguments
///
/// * `blob` - Bytes produced by [`save`]
/// * `encoder_version` - Version tag of the running encoder
/// * `dimension` - Output dimension of the running encoder
///
/// # Errors
///
/// - [`CacheError::IncompatibleVersion`] for a foreign schema, encoder or dimension
/// - [`CacheError::Corrupt`] for undecodable bytes, a manifest that disagrees
///   with its payload, indexes whose id sets differ, or keyword statistics
///   that do not match their postings
pub fn load(blob: &[u8], encoder_version: &str, dimension: usize) -> Result<IndexPair, CacheError> {
    let header: CacheHeader =
        serde_json::from_slice(blob).map_err(|e| CacheError::Corrupt(e.to_string()))?;
    check_manifest(&header.manifest, encoder_version, dimension)?;

    let CacheBlob { manifest, pair } =
        serde_json::from_slice(blob).map_err(|e| CacheError::Corrupt(e.to_string()))?;

    if pair.encoder_version() != manifest.encoder_version
        || pair.dimension() != manifest.dimension
        || pair.len() != manifest.document_count
    {
        return Err(CacheError::Corrupt(
            "Manifest does not match cached index pair".to_string(),
        ));
    }
    pair.check_integrity()
        .map_err(|e| CacheError::Corrupt(e.to_string()))?;

    Ok(pair)
}

fn check_manifest(
    manifest: &CacheManifest,
    encoder_version: &str,
    dimension: usize,
) -> Result<(), CacheError> {
    if !manifest.is_compatible() {
        return Err(CacheError::IncompatibleVersion(format!(
            "schema v{} requires reader v{}, this is v{}",
            manifest.schema_version, manifest.min_compatible_version, CURRENT_SCHEMA_VERSION
        )));
    }
    if manifest.encoder_version != encoder_version {
        return Err(CacheError::IncompatibleVersion(format!(
            "encoder '{}' does not match running encoder '{}'",
            manifest.encoder_version, encoder_version
        )));
    }
    if manifest.dimension != dimension {
        return Err(CacheError::IncompatibleVersion(format!(
            "dimension {} does not match running encoder dimension {}",
            manifest.dimension, dimension
        )));
    }
    Ok(())
}

/// Loads and validates the pair stored under `key`.
#[instrument(skip_all, fields(key = %key))]
pub async fn read(
    storage: &dyn StorageBackend,
    key: &str,
    encoder_version: &str,
    dimension: usize,
) -> Result<IndexPair, CacheError> {
    let blob = storage.load(key).await.map_err(|e| match e {
        StorageError::NotFound(_) => CacheError::Missing,
        other => CacheError::Storage(other.to_string()),
    })?;
    debug!("Read {} byte cache blob", blob.len());
    load(&blob, encoder_version, dimension)
}

/// Serializes `pair` and stores it under `key`.
#[instrument(skip_all, fields(key = %key, documents = pair.len()))]
pub async fn write(
    storage: &dyn StorageBackend,
    key: &str,
    pair: &IndexPair,
) -> Result<(), CacheError> {
    let blob = save(pair)?;
    storage
        .save(key, &blob)
        .await
        .map_err(|e| CacheError::Storage(e.to_string()))?;
    debug!("Wrote {} byte cache blob", blob.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tokenizer::Tokenizer;
    use crate::search::types::Document;
    use crate::storage::InMemoryStorage;

    fn sample_pair() -> IndexPair {
        let tokenizer = Tokenizer::default();
        let mut pair = IndexPair::empty(2, "test-encoder-v1", tokenizer);
        let docs = [
            (Document::new("1", "Portland Cement", "Type I", "Cement"), vec![1.0, 0.0]),
            (Document::new("2", "Steel Rods", "", "Reinforcement"), vec![0.0, 1.0]),
        ];
        for (doc, vector) in docs {
            let tokens = tokenizer.tokenize(&doc.index_text());
            pair.upsert(doc, vector, &tokens).unwrap();
        }
        pair
    }

    #[test]
    fn test_save_then_load_restores_pair() {
        let pair = sample_pair();
        let blob = save(&pair).unwrap();
        let loaded = load(&blob, "test-encoder-v1", 2).unwrap();
        assert_eq!(loaded, pair);
    }

    #[test]
    fn test_encoder_version_mismatch_rejected() {
        let blob = save(&sample_pair()).unwrap();
        assert!(matches!(
            load(&blob, "test-encoder-v2", 2),
            Err(CacheError::IncompatibleVersion(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let blob = save(&sample_pair()).unwrap();
        assert!(matches!(
            load(&blob, "test-encoder-v1", 3),
            Err(CacheError::IncompatibleVersion(_))
        ));
    }

    #[test]
    fn test_future_schema_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_slice(&save(&sample_pair()).unwrap()).unwrap();
        value["manifest"]["schema_version"] = serde_json::json!(7);
        value["manifest"]["min_compatible_version"] = serde_json::json!(7);
        let blob = serde_json::to_vec(&value).unwrap();

        assert!(matches!(
            load(&blob, "test-encoder-v1", 2),
            Err(CacheError::IncompatibleVersion(_))
        ));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        assert!(matches!(
            load(b"not json at all", "test-encoder-v1", 2),
            Err(CacheError::Corrupt(_))
        ));
        assert!(matches!(
            load(b"", "test-encoder-v1", 2),
            Err(CacheError::Corrupt(_))
        ));
    }

    #[test]
    fn test_truncated_blob_is_corrupt() {
        let blob = save(&sample_pair()).unwrap();
        let truncated = &blob[..blob.len() / 2];
        assert!(matches!(
            load(truncated, "test-encoder-v1", 2),
            Err(CacheError::Corrupt(_))
        ));
    }

    #[test]
    fn test_document_count_disagreement_is_corrupt() {
        let mut value: serde_json::Value =
            serde_json::from_slice(&save(&sample_pair()).unwrap()).unwrap();
        value["manifest"]["document_count"] = serde_json::json!(5);
        let blob = serde_json::to_vec(&value).unwrap();

        assert!(matches!(
            load(&blob, "test-encoder-v1", 2),
            Err(CacheError::Corrupt(_))
        ));
    }

    fn tampered(edit: impl FnOnce(&mut serde_json::Value)) -> Vec<u8> {
        let mut value: serde_json::Value =
            serde_json::from_slice(&save(&sample_pair()).unwrap()).unwrap();
        edit(&mut value);
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_inconsistent_keyword_statistics_are_corrupt() {
        let blob = tampered(|value| {
            let total = value["pair"]["keyword"]["total_len"].as_u64().unwrap();
            value["pair"]["keyword"]["total_len"] = serde_json::json!(total + 3);
        });
        assert!(matches!(
            load(&blob, "test-encoder-v1", 2),
            Err(CacheError::Corrupt(_))
        ));

        let blob = tampered(|value| {
            value["pair"]["keyword"]["doc_lengths"]["2"] = serde_json::json!(40);
        });
        assert!(matches!(
            load(&blob, "test-encoder-v1", 2),
            Err(CacheError::Corrupt(_))
        ));

        let blob = tampered(|value| {
            value["pair"]["keyword"]["postings"]["steel"] = serde_json::json!({"1": 1});
        });
        assert!(matches!(
            load(&blob, "test-encoder-v1", 2),
            Err(CacheError::Corrupt(_))
        ));
    }

    #[test]
    fn test_short_stored_vector_is_corrupt() {
        let blob = tampered(|value| {
            value["pair"]["vector"]["vectors"]["1"] = serde_json::json!([1.0]);
        });
        assert!(matches!(
            load(&blob, "test-encoder-v1", 2),
            Err(CacheError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_read_missing_key() {
        let storage = InMemoryStorage::new();
        assert!(matches!(
            read(&storage, "index/index_pair.json", "test-encoder-v1", 2).await,
            Err(CacheError::Missing)
        ));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let storage = InMemoryStorage::new();
        let pair = sample_pair();
        write(&storage, "index/index_pair.json", &pair).await.unwrap();

        let loaded = read(&storage, "index/index_pair.json", "test-encoder-v1", 2)
            .await
            .unwrap();
        assert_eq!(loaded, pair);
    }
}
