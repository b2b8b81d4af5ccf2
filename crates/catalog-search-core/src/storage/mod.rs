//! Storage abstractions: the catalog source and the index cache.
//!
//! # Storage Abstractions
//!
//! ## [`DocumentStore`]
//! Where documents come from. Queried in full on rebuild and one document at
//! a time on change notifications.
//!
//! ## [`StorageBackend`]
//! Simple key-value blob storage used to persist the serialized index pair
//! (see [`cache`]).
//!
//! # Implementations
//!
//! - [`InMemoryDocumentStore`] - catalog held in memory
//! - [`InMemoryStorage`] - blob storage held in memory (tests, ephemeral runs)
//! - [`NativeStorage`] - blob storage on the local filesystem

pub mod cache;
mod document_store;
mod native;

pub use cache::{CacheError, CacheManifest};
pub use document_store::{DocumentStore, InMemoryDocumentStore, StoreError};
pub use native::NativeStorage;

use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Key-value blob storage.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Save binary data to storage with a key.
    #[must_use = "Storage save failures should be handled"]
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Load binary data from storage by key.
    #[must_use = "Storage load failures should be handled"]
    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// In-memory blob storage.
///
/// Data lives as long as the value does; nothing touches disk.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(e: impl std::fmt::Display) -> StorageError {
    StorageError::IoError(format!("Lock poisoned: {}", e))
}

#[async_trait::async_trait]
impl StorageBackend for InMemoryStorage {
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .read()
            .map_err(poisoned)?
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}
