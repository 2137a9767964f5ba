//! Document store adapter.
//!
//! User documents live in two collections (clients and shops) of a document
//! store. All access goes through the [`DocumentStore`] trait, whose
//! operations share one contract regardless of backend:
//!
//! - Returned documents never carry `password`; `_id` is a string
//! - `update` appends `services` / `pets` and overwrites everything else
//! - `remove` pulls one element out of `services` or `pets`
//! - `find_by_id` and `delete` address a single document by id
//! - Store-native failures are translated into [`StoreError`]
//!
//! # Backends
//!
//! - [`MongoStore`] - `MongoDB` through the official driver (feature `mongodb`)
//! - [`MemoryStore`] - in-process, used by tests and the `memory` backend

mod memory;
#[cfg(feature = "mongodb")]
mod mongo;

pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;

use std::sync::Arc;

use async_trait::async_trait;
use petlife_core::UserId;
use serde_json::Value;
use thiserror::Error;

use crate::config::StoreBackend;
use crate::models::{Collections, Document, fields};

/// Errors returned by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The username is already taken in the collection.
    #[error("user {username} already exists in {collection}")]
    DuplicateKey {
        /// Offending username.
        username: String,
        /// Collection holding the existing user.
        collection: String,
    },

    /// No document matched.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store failed; the cause has been logged.
    #[error("store error: {0}")]
    Transient(String),

    /// The caller supplied a malformed request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Persistence operations over user documents.
///
/// Implementations must be safe to share between concurrent requests. No
/// operation retries; a failure is reported once.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return it with its assigned `_id`.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the username is taken, `Transient` on store failure.
    async fn create(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    /// Apply a partial update to the document with the given id.
    ///
    /// `services` and `pets` values are appended to their arrays, one store
    /// round-trip each. All other fields are overwritten in a single round-trip.
    /// Dotted keys (`pics.profile`) address nested fields. The updates are not
    /// atomic as a whole.
    ///
    /// # Errors
    ///
    /// `NotFound` if no document has the id, `DuplicateKey` if a new username
    /// is taken, `Transient` on store failure.
    async fn update(
        &self,
        collection: &str,
        doc: Document,
        id: &UserId,
    ) -> Result<Document, StoreError>;

    /// Pull one element out of `services` (by `service_id`) or `pets` (by
    /// `name`, given as `pet_name`).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless exactly one removal key is given, `NotFound`
    /// if no document has the id, `Transient` on store failure.
    async fn remove(
        &self,
        collection: &str,
        doc: &Document,
        id: &UserId,
    ) -> Result<Document, StoreError>;

    /// Fetch the document with the given id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no document has the id, `Transient` on store failure.
    async fn find_by_id(&self, collection: &str, id: &UserId) -> Result<Document, StoreError>;

    /// Delete the document with the given id. Deleting a document that is
    /// already gone succeeds.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is malformed, `Transient` on store failure.
    async fn delete(&self, collection: &str, id: &UserId) -> Result<(), StoreError>;

    /// Find the document whose username and password both match exactly.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches, `Transient` on store failure.
    async fn get_by_credentials(
        &self,
        collection: &str,
        username: &str,
        password: &str,
    ) -> Result<Document, StoreError>;

    /// Return every document of a collection.
    ///
    /// # Errors
    ///
    /// `NotFound` if the collection is empty, `Transient` on store failure.
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// `Transient` if it is not.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Open the configured store backend.
///
/// For `MongoDB` this connects and ensures the unique username index on both
/// collections.
///
/// # Errors
///
/// Returns `StoreError::Transient` if the store cannot be reached, or
/// `StoreError::InvalidArgument` if the backend was not compiled in.
pub async fn open(
    backend: &StoreBackend,
    collections: &Collections,
) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match backend {
        #[cfg(feature = "mongodb")]
        StoreBackend::Mongo { url, database } => {
            let store = MongoStore::connect(url, database).await?;
            store
                .ensure_indexes(&[collections.clients.as_str(), collections.shops.as_str()])
                .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongodb"))]
        StoreBackend::Mongo { .. } => {
            let _ = collections;
            Err(StoreError::InvalidArgument(
                "built without MongoDB support".to_owned(),
            ))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// A partial update split into array appends and field overwrites.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct UpdatePlan {
    /// `(array field, element)` pairs, in `services`, `pets` order.
    pub pushes: Vec<(&'static str, Value)>,
    /// Remaining fields to overwrite.
    pub set: Document,
}

impl UpdatePlan {
    pub(crate) fn new(mut doc: Document) -> Self {
        doc.remove(fields::ID);

        let pushes = fields::ARRAY_FIELDS
            .into_iter()
            .filter_map(|field| match doc.remove(field) {
                Some(Value::Null) | None => None,
                Some(value) => Some((field, value)),
            })
            .collect();

        Self { pushes, set: doc }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pushes.is_empty() && self.set.is_empty()
    }
}

/// Which array element a removal targets.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RemovalTarget {
    /// Array field holding the element.
    pub array: &'static str,
    /// Key inside the element that identifies it.
    pub key: &'static str,
    /// Value of that key.
    pub value: Value,
}

impl RemovalTarget {
    pub(crate) fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let present = |name: &str| doc.get(name).filter(|v| !v.is_null());
        match (present(fields::SERVICE_ID), present(fields::PET_NAME)) {
            (Some(value), None) => Ok(Self {
                array: fields::SERVICES,
                key: fields::SERVICE_ID,
                value: value.clone(),
            }),
            (None, Some(value)) => Ok(Self {
                array: fields::PETS,
                key: "name",
                value: value.clone(),
            }),
            (Some(_), Some(_)) => Err(StoreError::InvalidArgument(
                "only one of service_id or pet_name may be given".to_owned(),
            )),
            (None, None) => Err(StoreError::InvalidArgument(
                "one of service_id or pet_name is required".to_owned(),
            )),
        }
    }

    /// Whether an array element is the one targeted.
    pub(crate) fn matches(&self, element: &Value) -> bool {
        element.get(self.key) == Some(&self.value)
    }
}

/// Username carried by a document, for error reporting.
pub(crate) fn username_of(doc: &Document) -> String {
    doc.get(fields::USERNAME)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}
