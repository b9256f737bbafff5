//! Playlist resolution handler.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use tunebatch_core::PlaylistInfo;

use super::error::ApiError;
use crate::state::AppState;

/// Request body for resolving a playlist
#[derive(Debug, Deserialize)]
pub struct ResolvePlaylistBody {
    #[serde(default)]
    pub url: String,
}

/// Resolve a playlist URL into its songs
pub async fn resolve_playlist(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResolvePlaylistBody>,
) -> Result<Json<PlaylistInfo>, ApiError> {
    let catalog = state.catalog().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Playlist catalog not configured",
        )
    })?;

    if body.url.trim().is_empty() {
        return Err(ApiError::bad_request("Missing playlist URL"));
    }

    match catalog.resolve(body.url.trim()).await {
        Ok(info) => {
            info!(name = %info.name, total = info.total, "Resolved playlist");
            Ok(Json(info))
        }
        Err(e) => {
            warn!(url = %body.url, error = %e, "Playlist resolution failed");
            Err(e.into())
        }
    }
}
