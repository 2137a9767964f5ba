//! Credential login.

use petlife_core::UserKind;
use serde::Serialize;

use super::ServiceError;
use crate::db::{DocumentStore, StoreError};
use crate::models::{Collections, Document, document::document_id};
use crate::parser::{Operation, ParseError, RawRequest, parse_request};
use crate::token::TokenIssuer;

/// Result of a successful login.
#[derive(Debug, Serialize)]
pub struct Authenticated {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The user's document, without password.
    pub user: Document,
}

/// Authenticates users by username and password.
pub struct AuthService<'a> {
    store: &'a dyn DocumentStore,
    collections: &'a Collections,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        store: &'a dyn DocumentStore,
        collections: &'a Collections,
        tokens: &'a TokenIssuer,
    ) -> Self {
        Self {
            store,
            collections,
            tokens,
        }
    }

    /// Log in with the `username`, `password` and `type` form fields.
    ///
    /// The password is compared by exact equality with the stored value.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Parse` for bad input and
    /// `ServiceError::Unauthorized` if no user matches.
    pub async fn authenticate(&self, raw: &RawRequest) -> Result<Authenticated, ServiceError> {
        let parsed = parse_request(Operation::Auth, raw)?;
        let kind_text = parsed.text("type").ok_or(ParseError::MissingField("type"))?;
        let kind: UserKind = kind_text
            .parse()
            .map_err(|_| ParseError::InvalidChoice("type", kind_text.to_owned()))?;
        let username = parsed
            .text("username")
            .ok_or(ParseError::MissingField("username"))?;
        let password = parsed
            .text("password")
            .ok_or(ParseError::MissingField("password"))?;

        let user = self
            .store
            .get_by_credentials(self.collections.for_kind(kind), username, password)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => {
                    ServiceError::Unauthorized("invalid username or password".to_owned())
                }
                other => other.into(),
            })?;

        let id = document_id(&user)
            .ok_or_else(|| ServiceError::Store("stored user has no id".to_owned()))?;
        let token = self.tokens.issue(&id, kind)?;

        tracing::info!(user_id = %id, kind = %kind, "User authenticated");
        Ok(Authenticated { token, user })
    }
}
