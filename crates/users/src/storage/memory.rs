use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{FileStorage, StorageError, check_reference};
use crate::models::UploadedFile;

/// File storage held in memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryFileStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files.
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn store(&self, reference: &str, file: &UploadedFile) -> Result<(), StorageError> {
        check_reference(reference)?;
        self.files
            .write()
            .await
            .insert(reference.to_owned(), file.bytes.clone());
        Ok(())
    }

    async fn download(&self, reference: &str) -> Result<Vec<u8>, StorageError> {
        check_reference(reference)?;
        self.files
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(reference.to_owned()))
    }

    async fn delete(&self, reference: &str) -> Result<bool, StorageError> {
        check_reference(reference)?;
        Ok(self.files.write().await.remove(reference).is_some())
    }
}
