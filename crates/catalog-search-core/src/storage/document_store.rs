//! Document store trait: the catalog the engine indexes.
//!
//! The engine never owns catalog data. It asks a [`DocumentStore`] for a
//! full snapshot on rebuild and for single documents when a change
//! notification arrives. Implementations wrap whatever holds the catalog
//! (a database collection, an HTTP service, a JSON file).

use crate::search::types::{DocId, Document};
use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document not found
    #[error("Not found: {0}")]
    NotFound(DocId),

    /// I/O error (filesystem, network, etc.)
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Backend database error
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Source of catalog documents.
///
/// # Design Notes
///
/// - Read-only from the engine's point of view: writes happen elsewhere and
///   are announced through `apply_created` / `apply_updated` / `apply_removed`.
/// - `fetch_all` returns the whole corpus; catalogs are small enough that
///   streaming is not needed.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every document in the catalog.
    async fn fetch_all(&self) -> Result<Vec<Document>, StoreError>;

    /// Returns one document.
    ///
    /// Returns `Err(StoreError::NotFound)` if the id is unknown.
    async fn fetch_one(&self, id: &DocId) -> Result<Document, StoreError>;
}

/// In-memory document store.
///
/// Useful for tests and for embedding the engine where the catalog is
/// already in memory.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<DocId, Document>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `documents`.
    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().map(|d| (d.id.clone(), d)).collect()),
        }
    }

    /// Inserts or replaces a document.
    pub fn put(&self, document: Document) -> Result<(), StoreError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        documents.insert(document.id.clone(), document);
        Ok(())
    }

    /// Deletes a document. Returns `Ok(())` even if it didn't exist.
    pub fn delete(&self, id: &DocId) -> Result<(), StoreError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        documents.remove(id);
        Ok(())
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn fetch_all(&self) -> Result<Vec<Document>, StoreError> {
        let documents = self
            .documents
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(documents.values().cloned().collect())
    }

    async fn fetch_one(&self, id: &DocId) -> Result<Document, StoreError> {
        let documents = self
            .documents
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        documents
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

// Allow Arc<T> where T: DocumentStore to be used as a DocumentStore
#[async_trait::async_trait]
impl<T: DocumentStore> DocumentStore for std::sync::Arc<T> {
    async fn fetch_all(&self) -> Result<Vec<Document>, StoreError> {
        (**self).fetch_all().await
    }

    async fn fetch_one(&self, id: &DocId) -> Result<Document, StoreError> {
        (**self).fetch_one(id).await
    }
}
