//! Single-song download handler.

use axum::{extract::State, response::Response, Json};
use std::sync::Arc;
use tunebatch_core::SingleFetchRequest;

use super::error::ApiError;
use super::handlers::attachment_response;
use crate::state::AppState;

/// Fetch one song and stream it back as an attachment
pub async fn download_single(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SingleFetchRequest>,
) -> Result<Response, ApiError> {
    let stream = state.orchestrator().fetch_single(request).await?;
    Ok(attachment_response(stream))
}
