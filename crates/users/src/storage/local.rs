use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{FileStorage, StorageError, check_reference};
use crate::models::UploadedFile;

/// File storage backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Open a storage rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Directory holding the files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, reference: &str) -> Result<PathBuf, StorageError> {
        check_reference(reference)?;
        Ok(self.root.join(reference))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, reference: &str, file: &UploadedFile) -> Result<(), StorageError> {
        let path = self.path(reference)?;
        tokio::fs::write(&path, &file.bytes).await?;
        Ok(())
    }

    async fn download(&self, reference: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(reference.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, reference: &str) -> Result<bool, StorageError> {
        let path = self.path(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
