//! Engine setup and the search command.
//!
//! Opens the engine over the JSON catalog with the on-disk index cache and
//! runs queries in one of three ranking modes.

use crate::catalog::JsonFileDocumentStore;
use anyhow::{Context, Result};
use catalog_search_core::config::EngineConfig;
use catalog_search_core::embedding::HashingEncoder;
use catalog_search_core::search::{HybridSearchEngine, SearchParams, SearchResult};
use catalog_search_core::storage::{NativeStorage, StorageBackend};
use clap::ValueEnum;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub type Engine = HybridSearchEngine<JsonFileDocumentStore>;

/// Which signal(s) rank the results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SearchMode {
    /// Weighted fusion of semantic and keyword scores
    #[default]
    Hybrid,
    /// Raw cosine similarity only
    Semantic,
    /// Raw BM25 only
    Keyword,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::Hybrid => "hybrid",
            SearchMode::Semantic => "semantic",
            SearchMode::Keyword => "keyword",
        }
    }
}

/// Everything needed to open an engine.
pub struct EngineSetup<'a> {
    pub catalog: &'a Path,
    pub cache_dir: &'a Path,
    pub dimension: usize,
    pub config: EngineConfig,
}

impl EngineSetup<'_> {
    fn parts(
        &self,
    ) -> Result<(
        JsonFileDocumentStore,
        Arc<HashingEncoder>,
        Arc<dyn StorageBackend>,
    )> {
        let store = JsonFileDocumentStore::new(self.catalog);
        let encoder = HashingEncoder::new(self.dimension)
            .with_context(|| format!("Invalid embedding dimension {}", self.dimension))?;
        let storage: Arc<dyn StorageBackend> =
            Arc::new(NativeStorage::with_path(self.cache_dir).with_context(|| {
                format!("Failed to open cache directory: {}", self.cache_dir.display())
            })?);
        Ok((store, Arc::new(encoder), storage))
    }

    /// Opens the engine, loading the index cache or rebuilding on a miss.
    pub async fn open(self) -> Result<Engine> {
        let (store, encoder, storage) = self.parts()?;
        info!(
            "Opening catalog {} with cache in {}",
            self.catalog.display(),
            self.cache_dir.display()
        );
        HybridSearchEngine::start(store, encoder, storage, self.config)
            .await
            .context("Failed to start search engine")
    }

    /// Creates an engine with an empty index and the cache attached,
    /// for callers that rebuild immediately.
    pub fn empty(self) -> Result<Engine> {
        let (store, encoder, storage) = self.parts()?;
        let engine = HybridSearchEngine::new(store, encoder, self.config)
            .context("Failed to create search engine")?;
        Ok(engine.with_cache(storage))
    }
}

/// Runs one query in the given mode.
pub fn execute_search(
    engine: &Engine,
    query: &str,
    mode: SearchMode,
    params: SearchParams,
) -> Result<Vec<SearchResult>> {
    info!("Searching for \"{}\" ({})", query, mode.as_str());
    let results = match mode {
        SearchMode::Hybrid => engine.search(query, params),
        SearchMode::Semantic => engine.search_semantic(query, params.top_k, params.min_score),
        SearchMode::Keyword => engine.search_keyword(query, params.top_k, params.min_score),
    }
    .context("Search failed")?;
    info!("Found {} results", results.len());
    Ok(results)
}
