//! Login route.

use axum::{Json, extract::State};

use super::extract::RequestFields;
use crate::error::Result;
use crate::services::{AuthService, Authenticated};
use crate::state::AppState;

/// Exchange `username`, `password` and `type` for a bearer token.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    RequestFields(raw): RequestFields,
) -> Result<Json<Authenticated>> {
    let service = AuthService::new(state.store(), state.collections(), state.tokens());
    Ok(Json(service.authenticate(&raw).await?))
}
