//! Hybrid search engine combining vector (semantic) and keyword (BM25) search.
//!
//! This module provides the [`HybridSearchEngine`], the shared-state service
//! that owns the live [`IndexPair`] and orchestrates:
//! - exact cosine search over the vector index
//! - BM25 search over the keyword index
//! - min-max normalization and weighted fusion of the two
//!
//! # Concurrency
//!
//! The live pair sits behind a single swappable `Arc`. Queries clone the
//! `Arc` under a brief read lock and then run without any lock held, so any
//! number of them run concurrently and each sees one complete pair.
//!
//! Writers (rebuild and the three `apply_*` calls) are serialized by an async
//! mutex. Each one reads the currently installed pair after acquiring it,
//! builds the next pair off to the side and installs it with one pointer
//! swap. A later writer therefore always builds on the earlier writer's
//! result, and readers never see a half-built pair.
//!
//! Queries never perform I/O. Disk is touched only at startup, after a full
//! rebuild and on [`save_cache`](HybridSearchEngine::save_cache).

pub mod builder;
pub mod incremental;


use self::builder::build_index_pair;
use self::incremental::{remove_one, upsert_one};
use super::fusion::{weighted_fusion, FusedScore, FusionWeights};
use super::index::IndexPair;
use super::tokenizer::Tokenizer;
use super::types::{
    validate_min_score, validate_top_k, DocId, IndexOrigin, IndexStats, RebuildSummary,
    SearchError, SearchParams, SearchResult,
};
use crate::config::EngineConfig;
use crate::embedding::TextEncoder;
use crate::error::EncoderError;
use crate::storage::cache::{self, CacheError};
use crate::storage::{DocumentStore, StorageBackend, StoreError};
use instant::Instant;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

/// Text used to check that the encoder is reachable at startup.
const ENCODER_PROBE_TEXT: &str = "encoder availability probe";

/// The installed pair plus bookkeeping about how it got there.
#[derive(Debug, Clone)]
struct Installed {
    pair: Arc<IndexPair>,
    generation: u64,
    origin: IndexOrigin,
}

/// Hybrid search engine over a catalog.
///
/// # Example
///
/// ```
/// use catalog_search_core::config::EngineConfig;
/// use catalog_search_core::embedding::HashingEncoder;
/// use catalog_search_core::search::{Document, HybridSearchEngine, SearchParams};
/// use catalog_search_core::storage::InMemoryDocumentStore;
/// use std::sync::Arc;
///
/// # tokio_test_runtime(async {
/// let store = InMemoryDocumentStore::with_documents(vec![
///     Document::new("1", "Portland Cement", "Type I", "Cement"),
///     Document::new("2", "Steel Rods", "Grade 60", "Reinforcement"),
/// ]);
/// let engine = HybridSearchEngine::new(
///     store,
///     Arc::new(HashingEncoder::default()),
///     EngineConfig::default(),
/// )
/// .unwrap();
/// engine.rebuild().await.unwrap();
///
/// let results = engine.search("cement", SearchParams::default()).unwrap();
/// assert_eq!(results[0].doc_id.as_str(), "1");
/// # });
/// # fn tokio_test_runtime<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct HybridSearchEngine<S: DocumentStore> {
    /// Catalog source for rebuilds and single-document fetches
    pub(crate) store: S,
    /// Text → vector model
    pub(crate) encoder: Arc<dyn TextEncoder>,
    /// Blob storage for the index cache, if persistence is enabled
    pub(crate) cache: Option<Arc<dyn StorageBackend>>,
    pub(crate) config: EngineConfig,
    live: RwLock<Installed>,
    writer: tokio::sync::Mutex<()>,
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SearchError::DocumentNotFound(id),
            other => SearchError::Storage(other.to_string()),
        }
    }
}

impl<S: DocumentStore> HybridSearchEngine<S> {
    /// Creates an engine with an empty index pair and no cache.
    ///
    /// The encoder is probed once; an unreachable encoder is fatal.
    ///
    /// # Errors
    ///
    /// `SearchError::EncoderUnavailable` if the probe fails or returns a
    /// vector of the wrong dimension.
    pub fn new(
        store: S,
        encoder: Arc<dyn TextEncoder>,
        config: EngineConfig,
    ) -> Result<Self, SearchError> {
        probe_encoder(encoder.as_ref())?;

        let pair = IndexPair::empty(
            encoder.embedding_dim(),
            encoder.version(),
            Tokenizer::new(config.remove_stopwords),
        );
        Ok(Self {
            store,
            encoder,
            cache: None,
            config,
            live: RwLock::new(Installed {
                pair: Arc::new(pair),
                generation: 0,
                origin: IndexOrigin::Built,
            }),
            writer: tokio::sync::Mutex::new(()),
        })
    }

    /// Enables the index cache.
    pub fn with_cache(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.cache = Some(storage);
        self
    }

    /// Brings an engine up: probe the encoder, load the cache, rebuild on miss.
    ///
    /// A missing, corrupt or incompatible cache is logged and treated as a
    /// miss. After a rebuild the fresh pair is written back to the cache.
    ///
    /// # Errors
    ///
    /// Fails only if the encoder is unavailable or the rebuild itself fails
    /// (e.g. the document store is unreachable).
    #[instrument(skip_all)]
    pub async fn start(
        store: S,
        encoder: Arc<dyn TextEncoder>,
        storage: Arc<dyn StorageBackend>,
        config: EngineConfig,
    ) -> Result<Self, SearchError> {
        let engine = Self::new(store, encoder, config)?.with_cache(Arc::clone(&storage));
        let expected_tokenizer = Tokenizer::new(engine.config.remove_stopwords);

        let load_start = Instant::now();
        match cache::read(
            storage.as_ref(),
            &engine.config.cache_key,
            engine.encoder.version(),
            engine.encoder.embedding_dim(),
        )
        .await
        {
            Ok(pair) if pair.keyword().tokenizer() == expected_tokenizer => {
                let documents = pair.len();
                engine.install(pair, IndexOrigin::Cache);
                info!(
                    "Loaded index cache: {} documents in {:?}",
                    documents,
                    load_start.elapsed()
                );
                return Ok(engine);
            }
            Ok(_) => warn!("Index cache uses different tokenizer settings, rebuilding"),
            Err(CacheError::Missing) => info!("No index cache found, building from store"),
            Err(e) => warn!("Ignoring index cache: {}", e),
        }

        engine.rebuild().await?;
        Ok(engine)
    }

    /// Returns the currently installed index pair.
    ///
    /// The returned pair never changes; later installs replace the engine's
    /// pointer, not the pair.
    pub fn snapshot(&self) -> Arc<IndexPair> {
        Arc::clone(&self.installed().pair)
    }

    /// Default query parameters from the engine configuration.
    pub fn default_params(&self) -> SearchParams {
        SearchParams::from_config(&self.config)
    }

    /// Hybrid search: semantic and keyword scores, normalized and weighted.
    ///
    /// Every live document with a nonzero cosine similarity is ranked
    /// semantically, negative similarities included. A similarity of exactly
    /// 0.0 (an empty embedding or no shared direction) carries no signal and
    /// leaves the document out of the semantic ranking.
    ///
    /// # Errors
    ///
    /// - `SearchError::Validation` if any parameter is out of bounds
    /// - `SearchError::InvalidQuery` if the query is blank or cannot be encoded
    #[instrument(skip_all, fields(query_len = query.len(), top_k = params.top_k))]
    pub fn search(
        &self,
        query: &str,
        params: SearchParams,
    ) -> Result<Vec<SearchResult>, SearchError> {
        params.validate()?;
        let start = Instant::now();
        let pair = self.snapshot();
        let query_vector = self.encode_query(query)?;

        let semantic: Vec<(DocId, f32)> = pair
            .vector()
            .search(&query_vector, None)?
            .into_iter()
            .filter(|(_, score)| *score != 0.0)
            .collect();
        let keyword = pair.keyword().search(query);

        let fused = weighted_fusion(
            &semantic,
            &keyword,
            FusionWeights {
                semantic: params.semantic_weight,
                keyword: params.keyword_weight,
                min_score: params.min_score,
                top_k: params.top_k,
            },
        );

        let results = hydrate(&pair, fused);
        debug!(
            "Hybrid search: {} semantic, {} keyword, {} returned in {:?}",
            semantic.len(),
            keyword.len(),
            results.len(),
            start.elapsed()
        );
        Ok(results)
    }

    /// Ranks by raw cosine similarity only.
    ///
    /// Each result's `combined_score` is its cosine similarity; keyword fields
    /// are zero. Results below `min_score` are dropped.
    pub fn search_semantic(
        &self,
        query: &str,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>, SearchError> {
        validate_top_k(top_k)?;
        validate_min_score(min_score)?;
        let pair = self.snapshot();
        let query_vector = self.encode_query(query)?;

        let fused = pair
            .vector()
            .search(&query_vector, None)?
            .into_iter()
            .filter(|(_, score)| *score >= min_score && *score > 0.0)
            .take(top_k)
            .map(|(id, score)| FusedScore {
                id,
                semantic_raw: score,
                keyword_raw: 0.0,
                semantic_normalized: 0.0,
                keyword_normalized: 0.0,
                combined: score,
            })
            .collect();
        Ok(hydrate(&pair, fused))
    }

    /// Ranks by raw BM25 score only.
    ///
    /// Each result's `combined_score` is its BM25 score; semantic fields are
    /// zero. Results below `min_score` are dropped.
    pub fn search_keyword(
        &self,
        query: &str,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>, SearchError> {
        validate_top_k(top_k)?;
        validate_min_score(min_score)?;
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("Query is empty".to_string()));
        }
        let pair = self.snapshot();

        let fused = pair
            .keyword()
            .search(query)
            .into_iter()
            .filter(|(_, score)| *score >= min_score)
            .take(top_k)
            .map(|(id, score)| FusedScore {
                id,
                semantic_raw: 0.0,
                keyword_raw: score,
                semantic_normalized: 0.0,
                keyword_normalized: 0.0,
                combined: score,
            })
            .collect();
        Ok(hydrate(&pair, fused))
    }

    /// Statistics about the installed pair.
    pub fn stats(&self) -> IndexStats {
        let installed = self.installed();
        let pair = &installed.pair;
        IndexStats {
            documents_indexed: pair.len(),
            encoder_version: pair.encoder_version().to_string(),
            dimension: pair.dimension(),
            vocabulary_size: pair.keyword().vocabulary_size(),
            avg_doc_length: pair.keyword().avg_doc_length(),
            generation: installed.generation,
            origin: installed.origin,
        }
    }

    /// Rebuilds both indexes from the full catalog and installs the result.
    ///
    /// When a cache is configured the new pair is saved; a failed save is
    /// logged and does not fail the rebuild.
    #[instrument(skip_all)]
    pub async fn rebuild(&self) -> Result<RebuildSummary, SearchError> {
        let _writer = self.writer.lock().await;
        let start = Instant::now();

        let documents = self.store.fetch_all().await?;
        let fetched = documents.len();
        let pair = build_index_pair(
            documents,
            self.encoder.as_ref(),
            Tokenizer::new(self.config.remove_stopwords),
        )?;
        let documents_indexed = pair.len();
        let pair = Arc::new(pair);
        let generation = self.install_arc(Arc::clone(&pair), IndexOrigin::Built);

        info!(
            "Rebuilt index: {} documents (from {} fetched) in {:?}, generation {}",
            documents_indexed,
            fetched,
            start.elapsed(),
            generation
        );

        if let Some(storage) = &self.cache {
            if let Err(e) = cache::write(storage.as_ref(), &self.config.cache_key, &pair).await {
                warn!("Failed to save index cache after rebuild: {}", e);
            }
        }

        Ok(RebuildSummary { documents_indexed })
    }

    /// Fetches a newly created document and adds it to the index.
    pub async fn apply_created(&self, id: &DocId) -> Result<(), SearchError> {
        self.apply_upsert(id).await
    }

    /// Fetches a changed document and replaces it in the index.
    pub async fn apply_updated(&self, id: &DocId) -> Result<(), SearchError> {
        self.apply_upsert(id).await
    }

    /// Removes a deleted document from the index.
    ///
    /// Returns `false` (and installs nothing) if the id was not indexed.
    #[instrument(skip_all, fields(doc_id = %id))]
    pub async fn apply_removed(&self, id: &DocId) -> Result<bool, SearchError> {
        let _writer = self.writer.lock().await;
        let current = self.snapshot();

        match remove_one(&current, id) {
            Some(next) => {
                let generation = self.install(next, IndexOrigin::Built);
                info!("Removed document {}, generation {}", id, generation);
                Ok(true)
            }
            None => {
                debug!("Document {} not indexed, nothing to remove", id);
                Ok(false)
            }
        }
    }

    /// Writes the installed pair to the cache.
    ///
    /// # Errors
    ///
    /// `SearchError::Cache` if no cache is configured or the write fails.
    pub async fn save_cache(&self) -> Result<(), SearchError> {
        let storage = self
            .cache
            .as_ref()
            .ok_or_else(|| SearchError::Cache("No cache storage configured".to_string()))?;
        let pair = self.snapshot();
        cache::write(storage.as_ref(), &self.config.cache_key, &pair)
            .await
            .map_err(|e| SearchError::Cache(e.to_string()))?;
        info!("Saved index cache: {} documents", pair.len());
        Ok(())
    }

    #[instrument(skip_all, fields(doc_id = %id))]
    async fn apply_upsert(&self, id: &DocId) -> Result<(), SearchError> {
        let _writer = self.writer.lock().await;

        let document = self.store.fetch_one(id).await.map_err(|e| match e {
            StoreError::NotFound(_) => SearchError::DocumentNotFound(id.clone()),
            other => SearchError::from(other),
        })?;
        if document.id != *id {
            return Err(SearchError::Storage(format!(
                "Store returned document {} for id {}",
                document.id, id
            )));
        }

        let current = self.snapshot();
        let next = upsert_one(&current, document, self.encoder.as_ref())?;
        let generation = self.install(next, IndexOrigin::Built);
        info!("Upserted document {}, generation {}", id, generation);
        Ok(())
    }

    fn encode_query(&self, query: &str) -> Result<Vec<f32>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("Query is empty".to_string()));
        }
        self.encoder
            .encode(query)
            .map_err(|e| SearchError::InvalidQuery(format!("Failed to encode query: {}", e)))
    }

    fn installed(&self) -> Installed {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn install(&self, pair: IndexPair, origin: IndexOrigin) -> u64 {
        self.install_arc(Arc::new(pair), origin)
    }

    fn install_arc(&self, pair: Arc<IndexPair>, origin: IndexOrigin) -> u64 {
        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
        let generation = live.generation + 1;
        *live = Installed {
            pair,
            generation,
            origin,
        };
        generation
    }
}

fn probe_encoder(encoder: &dyn TextEncoder) -> Result<(), SearchError> {
    let dim = encoder.embedding_dim();
    if dim == 0 {
        return Err(SearchError::EncoderUnavailable(
            "Encoder reports dimension 0".to_string(),
        ));
    }
    let vector = encoder.encode(ENCODER_PROBE_TEXT).map_err(|e| match e {
        EncoderError::Unavailable(msg) => SearchError::EncoderUnavailable(msg),
        other => SearchError::EncoderUnavailable(other.to_string()),
    })?;
    if vector.len() != dim {
        return Err(SearchError::EncoderUnavailable(format!(
            "Encoder produced {} dimensions, declared {}",
            vector.len(),
            dim
        )));
    }
    debug!("Encoder {} ready ({} dimensions)", encoder.version(), dim);
    Ok(())
}

fn hydrate(pair: &IndexPair, fused: Vec<FusedScore<DocId>>) -> Vec<SearchResult> {
    fused
        .into_iter()
        .filter_map(|item| match pair.document(&item.id) {
            Some(document) => Some(SearchResult {
                doc_id: item.id,
                document: document.clone(),
                semantic_score: item.semantic_raw,
                keyword_score: item.keyword_raw,
                semantic_normalized: item.semantic_normalized,
                keyword_normalized: item.keyword_normalized,
                combined_score: item.combined,
            }),
            None => {
                warn!("Ranked id {} has no document in the index pair", item.id);
                None
            }
        })
        .collect()
}
