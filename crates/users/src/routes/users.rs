//! Client and shop routes.
//!
//! Both user kinds share one set of handlers; the kind comes from the route
//! the request was sent to.

use axum::{Json, extract::State, http::StatusCode};
use petlife_core::UserKind;

use super::extract::RequestFields;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Document;
use crate::services::{RegistrationService, RemovalService, UpdateService};
use crate::state::AppState;

async fn register(
    state: &AppState,
    kind: UserKind,
    fields: RequestFields,
) -> Result<(StatusCode, Json<Document>)> {
    let service = RegistrationService::new(state.store(), state.collections(), state.files());
    let created = service.register(kind, &fields.0).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    state: &AppState,
    auth: RequireAuth,
    kind: UserKind,
    fields: RequestFields,
) -> Result<Json<Document>> {
    let service = UpdateService::new(state.store(), state.collections(), state.files());
    Ok(Json(service.update(&auth.0, kind, &fields.0).await?))
}

async fn remove(
    state: &AppState,
    auth: RequireAuth,
    kind: UserKind,
    fields: RequestFields,
) -> Result<Json<Document>> {
    let service = RemovalService::new(state.store(), state.collections());
    Ok(Json(service.remove(&auth.0, kind, &fields.0).await?))
}

/// Register a client.
pub async fn register_client(
    State(state): State<AppState>,
    fields: RequestFields,
) -> Result<(StatusCode, Json<Document>)> {
    register(&state, UserKind::Client, fields).await
}

/// Register a shop.
pub async fn register_shop(
    State(state): State<AppState>,
    fields: RequestFields,
) -> Result<(StatusCode, Json<Document>)> {
    register(&state, UserKind::Shop, fields).await
}

/// Update the caller's client profile.
pub async fn update_client(
    State(state): State<AppState>,
    auth: RequireAuth,
    fields: RequestFields,
) -> Result<Json<Document>> {
    update(&state, auth, UserKind::Client, fields).await
}

/// Update the caller's shop profile.
pub async fn update_shop(
    State(state): State<AppState>,
    auth: RequireAuth,
    fields: RequestFields,
) -> Result<Json<Document>> {
    update(&state, auth, UserKind::Shop, fields).await
}

/// Drop a pet, selected by the `pet_name` query parameter.
pub async fn remove_pet(
    State(state): State<AppState>,
    auth: RequireAuth,
    fields: RequestFields,
) -> Result<Json<Document>> {
    remove(&state, auth, UserKind::Client, fields).await
}

/// Drop a service, selected by the `service_id` query parameter.
pub async fn remove_service(
    State(state): State<AppState>,
    auth: RequireAuth,
    fields: RequestFields,
) -> Result<Json<Document>> {
    remove(&state, auth, UserKind::Shop, fields).await
}
