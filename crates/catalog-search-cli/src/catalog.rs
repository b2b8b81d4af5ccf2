//! JSON file document store.
//!
//! The catalog is a JSON array of documents:
//!
//! ```json
//! [
//!   {"id": "cem-001", "title": "Portland Cement", "category": "Cement",
//!    "description": "Type I", "price": 12.5}
//! ]
//! ```
//!
//! The file is re-read on every fetch so edits made by other tools are seen
//! by the next `rebuild` or change notification.

use async_trait::async_trait;
use catalog_search_core::search::{DocId, Document};
use catalog_search_core::storage::{DocumentStore, StoreError};
use std::path::PathBuf;
use tracing::debug;

/// Document store backed by a JSON array file.
#[derive(Debug, Clone)]
pub struct JsonFileDocumentStore {
    path: PathBuf,
}

impl JsonFileDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_catalog(&self) -> Result<Vec<Document>, StoreError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            StoreError::IoError(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let documents: Vec<Document> = serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::SerializationError(format!("Invalid catalog {}: {}", self.path.display(), e))
        })?;
        debug!("Read {} documents from {}", documents.len(), self.path.display());
        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn fetch_all(&self) -> Result<Vec<Document>, StoreError> {
        self.read_catalog().await
    }

    async fn fetch_one(&self, id: &DocId) -> Result<Document, StoreError> {
        // Last entry wins, matching how a rebuild treats duplicate ids
        self.read_catalog()
            .await?
            .into_iter()
            .rev()
            .find(|doc| doc.id == *id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}
