//! Account routes.

use axum::{extract::State, http::StatusCode};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::AccountService;
use crate::state::AppState;

/// Delete the caller's account.
pub async fn delete_account(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<StatusCode> {
    AccountService::new(state.store(), state.collections(), state.files())
        .delete(&identity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
