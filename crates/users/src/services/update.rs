//! Profile updates.

use petlife_core::UserKind;

use super::{ServiceError, ensure_kind};
use crate::db::DocumentStore;
use crate::models::{Collections, Document, Identity};
use crate::parser::{Operation, RawRequest, parse_request};
use crate::storage::FileStorage;
use crate::validation::DocumentValidator;

const PICTURE_FIELDS: [&str; 2] = ["profile_pic", "banner_pic"];

/// Applies partial updates to the caller's own document.
pub struct UpdateService<'a> {
    store: &'a dyn DocumentStore,
    collections: &'a Collections,
    files: &'a dyn FileStorage,
}

impl<'a> UpdateService<'a> {
    /// Create a new update service.
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

    /// Update the caller's document with the supplied fields.
    ///
    /// # Errors
    ///
    /// `Forbidden` if the caller is not of `kind`, parse and validation
    /// errors for bad input, `NotFound` if the caller's document is gone.
    pub async fn update(
        &self,
        identity: &Identity,
        kind: UserKind,
        raw: &RawRequest,
    ) -> Result<Document, ServiceError> {
        ensure_kind(identity, kind)?;

        let mut parsed = parse_request(Operation::update(kind), raw)?;
        let collection = self.collections.for_kind(kind);

        // New pictures supersede the stored ones, so load them first.
        let current = if PICTURE_FIELDS.iter().any(|field| parsed.contains(field)) {
            Some(self.store.find_by_id(collection, &identity.id).await?)
        } else {
            None
        };
        let validator = DocumentValidator::new(self.files);
        match &current {
            Some(doc) => validator.with_current(doc).validate(&mut parsed).await?,
            None => validator.validate(&mut parsed).await?,
        }

        let updated = self
            .store
            .update(
                collection,
                parsed.into_document(),
                &identity.id,
            )
            .await?;
        tracing::info!(user_id = %identity.id, kind = %kind, "User updated");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petlife_core::UserId;
    use serde_json::json;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::UploadedFile;
    use crate::models::document::document_id;
    use crate::services::RegistrationService;
    use crate::services::testing::registration;
    use crate::storage::MemoryFileStorage;

    async fn register(
        store: &MemoryStore,
        files: &MemoryFileStorage,
        collections: &Collections,
        kind: UserKind,
    ) -> Identity {
        let created = RegistrationService::new(store, collections, files)
            .register(kind, &registration(kind, "someone"))
            .await
            .unwrap();
        Identity {
            id: document_id(&created).unwrap(),
            kind,
        }
    }

    #[tokio::test]
    async fn test_update_appends_service_and_sets_fields() {
        let store = MemoryStore::new();
        let files = MemoryFileStorage::new();
        let collections = Collections::default();
        let identity = register(&store, &files, &collections, UserKind::Shop).await;
        let service = UpdateService::new(&store, &collections, &files);

        let first = RawRequest::default().with_form("services", r#"{"service_id": "a"}"#);
        service.update(&identity, UserKind::Shop, &first).await.unwrap();

        let second = RawRequest::default()
            .with_form("services", r#"{"service_id": "b"}"#)
            .with_form("address", "Rua B, 2");
        let updated = service.update(&identity, UserKind::Shop, &second).await.unwrap();

        assert_eq!(
            updated["services"],
            json!([{"service_id": "a"}, {"service_id": "b"}])
        );
        assert_eq!(updated["address"], "Rua B, 2");
        assert!(!updated.contains_key("password"));
    }

    #[tokio::test]
    async fn test_update_uploads_profile_picture() {
        let store = MemoryStore::new();
        let files = MemoryFileStorage::new();
        let collections = Collections::default();
        let identity = register(&store, &files, &collections, UserKind::Shop).await;

        let raw = RawRequest::default()
            .with_file("profile_pic", UploadedFile::new("me.png", None, vec![9]));
        let updated = UpdateService::new(&store, &collections, &files)
            .update(&identity, UserKind::Shop, &raw)
            .await
            .unwrap();

        let reference = updated["pics"]["profile"].as_str().unwrap();
        assert_eq!(files.download(reference).await.unwrap(), vec![9]);
        assert!(!updated.contains_key("profile_pic"));
    }

    #[tokio::test]
    async fn test_client_update_uploads_profile_picture() {
        let store = MemoryStore::new();
        let files = MemoryFileStorage::new();
        let collections = Collections::default();
        let identity = register(&store, &files, &collections, UserKind::Client).await;

        let raw = RawRequest::default()
            .with_file("profile_pic", UploadedFile::new("me.png", None, vec![4]));
        let updated = UpdateService::new(&store, &collections, &files)
            .update(&identity, UserKind::Client, &raw)
            .await
            .unwrap();

        let reference = updated["pics"]["profile"].as_str().unwrap();
        assert_eq!(files.download(reference).await.unwrap(), vec![4]);
        assert!(!updated.contains_key("profile_pic"));
    }

    #[tokio::test]
    async fn test_second_picture_update_leaves_one_file() {
        let store = MemoryStore::new();
        let files = MemoryFileStorage::new();
        let collections = Collections::default();
        let identity = register(&store, &files, &collections, UserKind::Shop).await;
        let service = UpdateService::new(&store, &collections, &files);

        let first = RawRequest::default()
            .with_file("banner_pic", UploadedFile::new("a.png", None, vec![1]));
        let first = service.update(&identity, UserKind::Shop, &first).await.unwrap();

        let second = RawRequest::default()
            .with_file("banner_pic", UploadedFile::new("b.jpg", None, vec![2]));
        let second = service.update(&identity, UserKind::Shop, &second).await.unwrap();

        assert_ne!(first["pics"]["banner"], second["pics"]["banner"]);
        assert_eq!(files.len().await, 1);
        let reference = second["pics"]["banner"].as_str().unwrap();
        assert_eq!(files.download(reference).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let files = MemoryFileStorage::new();
        let collections = Collections::default();
        let identity = Identity {
            id: UserId::new(uuid::Uuid::new_v4().simple().to_string()),
            kind: UserKind::Client,
        };
        let service = UpdateService::new(&store, &collections, &files);

        let raw = RawRequest::default().with_form("name", "New");
        let err = service.update(&identity, UserKind::Client, &raw).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let raw = RawRequest::default()
            .with_file("profile_pic", UploadedFile::new("me.png", None, vec![1]));
        let err = service.update(&identity, UserKind::Client, &raw).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(files.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_invalid_email() {
        let store = MemoryStore::new();
        let files = MemoryFileStorage::new();
        let collections = Collections::default();
        let identity = register(&store, &files, &collections, UserKind::Client).await;

        let raw = RawRequest::default().with_form("email", "not an email");
        let err = UpdateService::new(&store, &collections, &files)
            .update(&identity, UserKind::Client, &raw)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_other_kind_is_forbidden() {
        let store = MemoryStore::new();
        let files = MemoryFileStorage::new();
        let collections = Collections::default();
        let identity = register(&store, &files, &collections, UserKind::Client).await;

        let err = UpdateService::new(&store, &collections, &files)
            .update(&identity, UserKind::Shop, &RawRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_deleted_user_is_not_found() {
        let store = MemoryStore::new();
        let files = MemoryFileStorage::new();
        let collections = Collections::default();
        let identity = register(&store, &files, &collections, UserKind::Client).await;
        store.delete("clients", &identity.id).await.unwrap();

        let raw = RawRequest::default().with_form("name", "New");
        let err = UpdateService::new(&store, &collections, &files)
            .update(&identity, UserKind::Client, &raw)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
