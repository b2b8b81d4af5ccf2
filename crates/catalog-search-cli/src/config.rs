//! Configuration and path resolution for the CLI.
//!
//! Resolves where the catalog and the index cache live:
//! - Explicit command-line flags
//! - Environment variables (`CATALOG_SEARCH_CATALOG`, `CATALOG_SEARCH_CACHE_DIR`)
//! - Platform standard cache directory

use anyhow::{anyhow, Context, Result};
use catalog_search_core::config::EngineConfig;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable naming the catalog JSON file.
pub const CATALOG_ENV: &str = "CATALOG_SEARCH_CATALOG";

/// Environment variable naming the cache directory.
pub const CACHE_DIR_ENV: &str = "CATALOG_SEARCH_CACHE_DIR";

/// Returns the catalog path, or an error explaining how to supply one.
pub fn catalog_path(custom: Option<&PathBuf>) -> Result<PathBuf> {
    let path = custom.cloned().ok_or_else(|| {
        anyhow!(
            "No catalog given. Pass --catalog <FILE> or set ${}",
            CATALOG_ENV
        )
    })?;
    if !path.exists() {
        return Err(anyhow!("Catalog file not found: {}", path.display()));
    }
    Ok(path)
}

/// Returns the cache directory.
///
/// Platform defaults:
/// - macOS: `~/Library/Caches/dev.catalog-search.CatalogSearch/`
/// - Linux: `~/.cache/catalogsearch/`
/// - Windows: `%LOCALAPPDATA%\catalog-search\CatalogSearch\cache\`
pub fn get_cache_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.clone());
    }

    ProjectDirs::from("dev", "catalog-search", "CatalogSearch")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine cache directory"))
}

/// Loads engine settings from a JSON file, or the defaults when none is given.
///
/// Fields missing from the file keep their default values.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}
