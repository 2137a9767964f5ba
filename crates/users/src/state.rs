//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::UsersConfig;
use crate::db::DocumentStore;
use crate::models::Collections;
use crate::storage::FileStorage;
use crate::token::TokenIssuer;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// store handle, file storage and token issuer, all created once at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: UsersConfig,
    store: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStorage>,
    tokens: TokenIssuer,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Users service configuration
    /// * `store` - Document store handle
    /// * `files` - Picture storage
    #[must_use]
    pub fn new(
        config: UsersConfig,
        store: Arc<dyn DocumentStore>,
        files: Arc<dyn FileStorage>,
    ) -> Self {
        let tokens = TokenIssuer::new(config.token_secret.clone(), config.token_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                files,
                tokens,
            }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &UsersConfig {
        &self.inner.config
    }

    /// Get a reference to the collection names.
    #[must_use]
    pub fn collections(&self) -> &Collections {
        &self.inner.config.collections
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the picture storage.
    #[must_use]
    pub fn files(&self) -> &dyn FileStorage {
        self.inner.files.as_ref()
    }

    /// Get a reference to the token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }
}
