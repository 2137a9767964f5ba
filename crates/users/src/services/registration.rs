//! Account registration.

use petlife_core::UserKind;
use serde_json::Value;

use super::ServiceError;
use crate::db::DocumentStore;
use crate::models::{Collections, Document};
use crate::parser::{Operation, RawRequest, parse_request};
use crate::storage::FileStorage;
use crate::validation::DocumentValidator;

/// Registers new clients and shops.
pub struct RegistrationService<'a> {
    store: &'a dyn DocumentStore,
    collections: &'a Collections,
    files: &'a dyn FileStorage,
}

impl<'a> RegistrationService<'a> {
    /// Create a new registration service.
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

    /// Register a user of the given kind.
    ///
    /// The new document starts with an empty `pets` (clients) or `services`
    /// (shops) array.
    ///
    /// # Errors
    ///
    /// Parse and validation errors are returned before the store is touched.
    /// A taken username is `ServiceError::Conflict`.
    pub async fn register(&self, kind: UserKind, raw: &RawRequest) -> Result<Document, ServiceError> {
        let mut parsed = parse_request(Operation::registration(kind), raw)?;
        DocumentValidator::new(self.files).validate(&mut parsed).await?;

        let mut doc = parsed.into_document();
        doc.insert(kind.relationship_field().to_owned(), Value::Array(Vec::new()));

        let created = self
            .store
            .create(self.collections.for_kind(kind), doc)
            .await?;
        tracing::info!(kind = %kind, "User registered");
        Ok(created)
    }
}
