//! Catalog search CLI - command-line front end for the hybrid search engine.
//!
//! # Usage
//!
//! ```bash
//! # Search (builds the index on first use, then reuses the cache)
//! cs --catalog catalog.json search "portland cement"
//! cs search "steel rods" -n 3 --min-score 0.1 --json
//! cs search "roof" --mode keyword
//!
//! # Rebuild the index from the catalog
//! cs rebuild
//!
//! # Apply single-item catalog changes and persist them
//! cs created sku-123
//! cs updated sku-123
//! cs removed sku-123
//!
//! # Show index statistics
//! cs stats
//! ```
//!
//! `CATALOG_SEARCH_CATALOG` and `CATALOG_SEARCH_CACHE_DIR` may replace the
//! `--catalog` and `--cache-dir` flags.

mod catalog;
mod config;
mod output;
mod search;

use anyhow::{Context, Result};
use catalog_search_core::embedding::DEFAULT_HASHING_DIM;
use catalog_search_core::search::{DocId, SearchParams};
use clap::{Parser, Subcommand};
use search::{EngineSetup, SearchMode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog hybrid search CLI.
///
/// Ranks catalog items by a weighted mix of semantic similarity and BM25
/// keyword relevance. The index is cached on disk between runs.
#[derive(Parser)]
#[command(name = "cs", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Catalog JSON file (array of documents)
    #[arg(long, global = true, env = config::CATALOG_ENV)]
    catalog: Option<PathBuf>,

    /// Index cache directory (default: platform cache location)
    #[arg(long, global = true, env = config::CACHE_DIR_ENV)]
    cache_dir: Option<PathBuf>,

    /// Engine settings file (JSON)
    #[arg(long, global = true)]
    engine_config: Option<PathBuf>,

    /// Embedding dimension of the hashing encoder
    #[arg(long, global = true, default_value_t = DEFAULT_HASHING_DIM)]
    dimension: usize,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Search the catalog
    Search {
        /// Search query
        query: String,

        /// Maximum number of results to return (1-50)
        #[arg(short = 'n', long)]
        top_k: Option<usize>,

        /// Minimum score a result must reach
        #[arg(long)]
        min_score: Option<f32>,

        /// Weight of the semantic signal (0-1)
        #[arg(long)]
        semantic_weight: Option<f32>,

        /// Weight of the keyword signal (0-1)
        #[arg(long)]
        keyword_weight: Option<f32>,

        /// Ranking mode
        #[arg(long, value_enum, default_value_t = SearchMode::Hybrid)]
        mode: SearchMode,
    },
    /// Rebuild the whole index from the catalog
    Rebuild,
    /// Show index statistics
    Stats,
    /// Index a newly created catalog item
    Created { id: String },
    /// Re-index a changed catalog item
    Updated { id: String },
    /// Drop a deleted catalog item from the index
    Removed { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let catalog = config::catalog_path(cli.catalog.as_ref())?;
    let cache_dir = config::get_cache_dir(cli.cache_dir.as_ref())?;
    let engine_config = config::load_engine_config(cli.engine_config.as_deref())?;
    let setup = EngineSetup {
        catalog: &catalog,
        cache_dir: &cache_dir,
        dimension: cli.dimension,
        config: engine_config,
    };

    match cli.command {
        Command::Search {
            query,
            top_k,
            min_score,
            semantic_weight,
            keyword_weight,
            mode,
        } => {
            let engine = setup.open().await?;
            let defaults = engine.default_params();
            let params = SearchParams::new(
                top_k.unwrap_or(defaults.top_k),
                min_score.unwrap_or(defaults.min_score),
                semantic_weight.unwrap_or(defaults.semantic_weight),
                keyword_weight.unwrap_or(defaults.keyword_weight),
            );
            let results = search::execute_search(&engine, &query, mode, params)?;

            let output = if cli.json {
                output::format_json(&query, mode.as_str(), &results)
            } else {
                output::format_human(&query, &results)
            };
            println!("{}", output);
        }
        Command::Rebuild => {
            let engine = setup.empty()?;
            let summary = engine.rebuild().await.context("Rebuild failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Indexed {} documents", summary.documents_indexed);
            }
        }
        Command::Stats => {
            let engine = setup.open().await?;
            let stats = engine.stats();
            let output = if cli.json {
                output::format_stats_json(&stats)
            } else {
                output::format_stats_human(&stats)
            };
            println!("{}", output);
        }
        Command::Created { id } => {
            let engine = setup.open().await?;
            let id = DocId::new(id);
            engine
                .apply_created(&id)
                .await
                .with_context(|| format!("Failed to index {}", id))?;
            engine.save_cache().await.context("Failed to save index")?;
            println!("Indexed {}", id);
        }
        Command::Updated { id } => {
            let engine = setup.open().await?;
            let id = DocId::new(id);
            engine
                .apply_updated(&id)
                .await
                .with_context(|| format!("Failed to re-index {}", id))?;
            engine.save_cache().await.context("Failed to save index")?;
            println!("Re-indexed {}", id);
        }
        Command::Removed { id } => {
            let engine = setup.open().await?;
            let id = DocId::new(id);
            if engine.apply_removed(&id).await? {
                engine.save_cache().await.context("Failed to save index")?;
                println!("Removed {}", id);
            } else {
                println!("{} was not indexed", id);
            }
        }
    }

    Ok(())
}
