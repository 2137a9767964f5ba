//! Removal of pets and services.

use petlife_core::UserKind;

use super::{ServiceError, ensure_kind};
use crate::db::DocumentStore;
use crate::models::{Collections, Document, Identity};
use crate::parser::{Operation, RawRequest, parse_request};

/// Pulls a pet (clients) or a service (shops) out of the caller's document.
pub struct RemovalService<'a> {
    store: &'a dyn DocumentStore,
    collections: &'a Collections,
}

impl<'a> RemovalService<'a> {
    /// Create a new removal service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, collections: &'a Collections) -> Self {
        Self { store, collections }
    }

    /// Remove the pet named by `pet_name` or the service with `service_id`,
    /// both read from the query string.
    ///
    /// # Errors
    ///
    /// `Forbidden` if the caller is not of `kind`, `Parse` if the key is
    /// missing, `NotFound` if the caller's document is gone.
    pub async fn remove(
        &self,
        identity: &Identity,
        kind: UserKind,
        raw: &RawRequest,
    ) -> Result<Document, ServiceError> {
        ensure_kind(identity, kind)?;

        let parsed = parse_request(Operation::removal(kind), raw)?;
        let updated = self
            .store
            .remove(
                self.collections.for_kind(kind),
                &parsed.into_document(),
                &identity.id,
            )
            .await?;
        tracing::info!(user_id = %identity.id, kind = %kind, "Entry removed");
        Ok(updated)
    }
}
