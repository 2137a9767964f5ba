//! Picture storage.
//!
//! Uploaded pictures are kept behind the [`FileStorage`] trait and addressed
//! by an opaque reference of the form `<uuid><extension>`.
//!
//! # Backends
//!
//! - [`LocalFileStorage`] - one file per reference under a directory
//! - [`MemoryFileStorage`] - in-process map, for tests and ephemeral runs

mod local;
mod memory;

pub use local::LocalFileStorage;
pub use memory::MemoryFileStorage;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::UploadedFile;

/// Errors returned by file storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The reference is not a plain file name.
    #[error("invalid file reference: {0}")]
    InvalidReference(String),

    /// No file exists under the reference.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The backend failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage for uploaded files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write a file under an explicit reference, overwriting any previous one.
    async fn store(&self, reference: &str, file: &UploadedFile) -> Result<(), StorageError>;

    /// Read the contents stored under a reference.
    async fn download(&self, reference: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete the file under a reference. Returns whether a file was removed.
    async fn delete(&self, reference: &str) -> Result<bool, StorageError>;

    /// Store a file under a freshly generated reference and return it.
    async fn upload(&self, file: &UploadedFile) -> Result<String, StorageError> {
        let reference = format!("{}{}", Uuid::new_v4().simple(), file.extension());
        self.store(&reference, file).await?;
        tracing::debug!(reference = %reference, size = file.bytes.len(), "File uploaded");
        Ok(reference)
    }

    /// Swap the file under an existing reference for a new one, keeping the
    /// reference.
    async fn replace(&self, reference: &str, file: &UploadedFile) -> Result<String, StorageError> {
        if !self.delete(reference).await? {
            return Err(StorageError::NotFound(reference.to_owned()));
        }
        self.store(reference, file).await?;
        Ok(reference.to_owned())
    }
}

/// Check that a reference is a single, plain path component.
pub(crate) fn check_reference(reference: &str) -> Result<(), StorageError> {
    let plain = !reference.is_empty()
        && reference != "."
        && !reference.contains("..")
        && !reference.contains(['/', '\\', '\0']);
    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidReference(reference.to_owned()))
    }
}
