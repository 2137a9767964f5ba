//! Service error types.

use thiserror::Error;

use crate::db::StoreError;
use crate::parser::ParseError;
use crate::storage::StorageError;
use crate::token::TokenError;
use crate::validation::ValidationError;

/// Errors surfaced by the services, already classified for the caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Request fields failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Parsed fields broke a business rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Credentials did not match.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller may not act on this kind of user.
    #[error("{0}")]
    Forbidden(String),

    /// The username is taken.
    #[error("{0}")]
    Conflict(String),

    /// Nothing matched.
    #[error("{0}")]
    NotFound(String),

    /// The request was malformed in a way the parser cannot see.
    #[error("{0}")]
    InvalidArgument(String),

    /// The store failed.
    #[error("store error: {0}")]
    Store(String),

    /// File storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { .. } => Self::Conflict(err.to_string()),
            StoreError::NotFound(msg) => Self::NotFound(msg),
            StoreError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            StoreError::Transient(msg) => Self::Store(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_classification() {
        let conflict = ServiceError::from(StoreError::DuplicateKey {
            username: "bob".to_owned(),
            collection: "clients".to_owned(),
        });
        assert!(matches!(conflict, ServiceError::Conflict(ref msg) if msg.contains("bob")));

        assert!(matches!(
            ServiceError::from(StoreError::NotFound("x".to_owned())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Transient("x".to_owned())),
            ServiceError::Store(_)
        ));
    }
}
