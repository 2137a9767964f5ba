//! Bearer token authentication.
//!
//! Provides the [`RequireAuth`] extractor, which verifies the
//! `Authorization: Bearer <token>` header and yields the caller's
//! [`Identity`].

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::set_sentry_user;
use crate::models::Identity;
use crate::state::AppState;
use crate::token::TokenError;

/// Extractor that requires a valid access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(identity): RequireAuth) -> String {
///     format!("Hello, {}!", identity.id)
/// }
/// ```
pub struct RequireAuth(pub Identity);

/// Error returned when a request is not authenticated.
#[derive(Debug)]
pub enum AuthRejection {
    /// No bearer token was sent.
    MissingToken,
    /// The token failed verification.
    InvalidToken(TokenError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "missing bearer token".to_string(),
            Self::InvalidToken(err) => err.to_string(),
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthRejection::MissingToken)?;

        let identity = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AuthRejection::InvalidToken(e)
        })?;

        set_sentry_user(&identity.id, identity.kind.as_str());
        Ok(Self(identity))
    }
}
