// Native filesystem blob storage

use super::{StorageBackend, StorageError};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Filesystem storage backend.
///
/// Keys map to paths under a base directory; nested keys such as
/// `index/index_pair.json` create subdirectories. Writes go to a sibling
/// temporary file that is then renamed over the target, so a crash mid-write
/// never leaves a truncated blob behind.
#[derive(Debug, Clone)]
pub struct NativeStorage {
    base_path: PathBuf,
}

impl NativeStorage {
    /// Creates a NativeStorage rooted at `base_path`, creating it if needed.
    pub fn with_path(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)
            .map_err(|e| StorageError::IoError(format!("Failed to create directory: {}", e)))?;

        Ok(Self { base_path })
    }

    fn get_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    async fn ensure_parent_dirs(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::IoError(format!("Failed to create directory: {}", e)))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StorageBackend for NativeStorage {
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.get_path(key);
        self.ensure_parent_dirs(&path).await?;

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| StorageError::IoError(format!("Failed to write file: {}", e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::IoError(format!("Failed to replace file: {}", e)))?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.get_path(key);
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::IoError(format!("Failed to read file: {}", e))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = NativeStorage::with_path(temp_dir.path()).unwrap();

        storage.save("test.bin", b"catalog").await.unwrap();
        assert_eq!(storage.load("test.bin").await.unwrap(), b"catalog");
    }

    #[tokio::test]
    async fn test_nested_keys_create_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = NativeStorage::with_path(temp_dir.path()).unwrap();

        storage.save("index/index_pair.json", b"{}").await.unwrap();
        assert!(temp_dir.path().join("index/index_pair.json").exists());
        assert!(!temp_dir.path().join("index/index_pair.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let storage = NativeStorage::with_path(temp_dir.path()).unwrap();

        storage.save("blob", b"first version").await.unwrap();
        storage.save("blob", b"second").await.unwrap();
        assert_eq!(storage.load("blob").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let storage = NativeStorage::with_path(temp_dir.path()).unwrap();

        assert!(matches!(
            storage.load("missing").await,
            Err(StorageError::NotFound(key)) if key == "missing"
        ));
    }
}
