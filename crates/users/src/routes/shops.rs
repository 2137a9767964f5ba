//! Public shop directory and picture downloads.

use axum::{
    Json,
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};

use crate::error::Result;
use crate::models::Document;
use crate::services::ListingService;
use crate::state::AppState;

/// List every shop.
pub async fn list_shops(State(state): State<AppState>) -> Result<Json<Vec<Document>>> {
    let shops = ListingService::new(state.store(), state.collections())
        .list_shops()
        .await?;
    Ok(Json(shops))
}

/// Serve an uploaded picture by its reference.
pub async fn download_picture(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse> {
    let bytes = state.files().download(&reference).await?;
    Ok(([(CONTENT_TYPE, content_type(&reference))], bytes))
}

fn content_type(reference: &str) -> &'static str {
    let extension = reference
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
