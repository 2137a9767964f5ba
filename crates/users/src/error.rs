//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; the body is always `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::ServiceError;
use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Application-level error type for the users service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Service operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(reference) => Self::NotFound(reference),
            StorageError::InvalidReference(reference) => {
                Self::BadRequest(format!("invalid file reference: {reference}"))
            }
            StorageError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                ServiceError::Parse(_)
                | ServiceError::InvalidArgument(_)
                | ServiceError::Validation(
                    ValidationError::InvalidEmail
                    | ValidationError::InvalidTaxId(_)
                    | ValidationError::NotText(_),
                ) => StatusCode::BAD_REQUEST,
                ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Validation(ValidationError::Upload(_))
                | ServiceError::Store(_)
                | ServiceError::Storage(_)
                | ServiceError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called once a request is authenticated to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, kind: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
        scope.set_tag("user_kind", kind);
    });
}

#[cfg(test)]
mod tests {
    use petlife_core::TaxIdKind;

    use super::*;
    use crate::db::StoreError;
    use crate::parser::ParseError;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("abc.png".to_string());
        assert_eq!(err.to_string(), "Not found: abc.png");

        let err = AppError::from(ServiceError::Parse(ParseError::MissingField("username")));
        assert_eq!(err.to_string(), "missing required field: username");
    }

    #[test]
    fn test_service_error_status_codes() {
        assert_eq!(
            get_status(ServiceError::Parse(ParseError::TypeMismatch("pets"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ServiceError::Validation(ValidationError::InvalidTaxId(
                TaxIdKind::Cpf
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ServiceError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(ServiceError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(ServiceError::from(StoreError::DuplicateKey {
                username: "bob".to_string(),
                collection: "clients".to_string(),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ServiceError::from(StoreError::NotFound("x".to_string()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ServiceError::from(StoreError::Transient("x".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_error_status_codes() {
        assert_eq!(
            get_status(StorageError::NotFound("a.png".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(StorageError::InvalidReference("../a".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Internal("connection refused to 10.0.0.3".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("Internal server error"));
        assert!(!text.contains("10.0.0.3"));
    }
}
