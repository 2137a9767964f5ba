//! Shop listing.

use super::ServiceError;
use crate::db::DocumentStore;
use crate::models::{Collections, Document};

/// Lists registered shops.
pub struct ListingService<'a> {
    store: &'a dyn DocumentStore,
    collections: &'a Collections,
}

impl<'a> ListingService<'a> {
    /// Create a new listing service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, collections: &'a Collections) -> Self {
        Self { store, collections }
    }

    /// Return every shop, without passwords.
    ///
    /// # Errors
    ///
    /// `NotFound` when no shop is registered.
    pub async fn list_shops(&self) -> Result<Vec<Document>, ServiceError> {
        Ok(self.store.list_all(&self.collections.shops).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petlife_core::UserKind;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::RegistrationService;
    use crate::services::testing::registration;
    use crate::storage::MemoryFileStorage;

    #[tokio::test]
    async fn test_list_shops() {
        let store = MemoryStore::new();
        let files = MemoryFileStorage::new();
        let collections = Collections::default();
        let listing = ListingService::new(&store, &collections);

        assert!(matches!(
            listing.list_shops().await,
            Err(ServiceError::NotFound(_))
        ));

        let registration_service = RegistrationService::new(&store, &collections, &files);
        for name in ["alice", "carol"] {
            registration_service
                .register(UserKind::Shop, &registration(UserKind::Shop, name))
                .await
                .unwrap();
        }
        registration_service
            .register(UserKind::Client, &registration(UserKind::Client, "bob"))
            .await
            .unwrap();

        let shops = listing.list_shops().await.unwrap();
        assert_eq!(shops.len(), 2);
        assert!(shops.iter().all(|shop| !shop.contains_key("password")));
    }
}
