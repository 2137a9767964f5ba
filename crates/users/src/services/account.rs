//! Account deletion.

use super::ServiceError;
use crate::db::{DocumentStore, StoreError};
use crate::models::document::picture_reference;
use crate::models::{Collections, Identity, fields};
use crate::storage::FileStorage;

/// Deletes the caller's account and its pictures.
pub struct AccountService<'a> {
    store: &'a dyn DocumentStore,
    collections: &'a Collections,
    files: &'a dyn FileStorage,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        store: &'a dyn DocumentStore,
        collections: &'a Collections,
        files: &'a dyn FileStorage,
    ) -> Self {
        Self {
            store,
            collections,
            files,
        }
    }

    /// Delete the caller's document. Deleting twice succeeds.
    ///
    /// Stored pictures are removed once the document is gone. A picture that
    /// cannot be removed is logged and does not fail the request.
    ///
    /// # Errors
    ///
    /// `NotFound` if the caller's id is malformed, `Store` on store failure.
    pub async fn delete(&self, identity: &Identity) -> Result<(), ServiceError> {
        let collection = self.collections.for_kind(identity.kind);
        let current = match self.store.find_by_id(collection, &identity.id).await {
            Ok(doc) => Some(doc),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };

        self.store.delete(collection, &identity.id).await?;

        let references: Vec<&str> = current
            .iter()
            .flat_map(|doc| {
                fields::PICTURE_KEYS
                    .iter()
                    .filter_map(move |key| picture_reference(doc, key))
            })
            .collect();
        for reference in references {
            match self.files.delete(reference).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(reference, "Picture already gone"),
                Err(e) => tracing::warn!(reference, error = %e, "Failed to delete picture"),
            }
        }

        tracing::info!(user_id = %identity.id, kind = %identity.kind, "Account deleted");
        Ok(())
    }
}
