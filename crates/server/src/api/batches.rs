//! Batch API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use tunebatch_core::{BatchId, BatchProgress, WorkItem};

use super::error::ApiError;
use super::handlers::attachment_response;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// One song in a batch submission
#[derive(Debug, Deserialize)]
pub struct SongBody {
    /// Missing titles are rejected by batch validation with a 400
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    /// Overrides the derived `"{title} {artist} official audio"` query
    #[serde(default)]
    pub search_query: Option<String>,
    /// Overrides the derived `"{title} - {artist}.mp3"` file name
    #[serde(default)]
    pub filename: Option<String>,
}

impl From<SongBody> for WorkItem {
    fn from(song: SongBody) -> Self {
        let mut item = WorkItem::new(song.title, song.artist);
        if let Some(query) = song.search_query {
            item = item.with_search_query(query);
        }
        if let Some(filename) = song.filename {
            item = item.with_filename(&filename);
        }
        item
    }
}

/// Request body for submitting a batch
#[derive(Debug, Deserialize)]
pub struct SubmitBatchBody {
    #[serde(default)]
    pub songs: Vec<SongBody>,
}

/// Response for an accepted batch
#[derive(Debug, Serialize)]
pub struct SubmitBatchResponse {
    pub batch_id: BatchId,
    pub total: usize,
}

/// Progress of a batch
#[derive(Debug, Serialize)]
pub struct BatchProgressResponse {
    pub batch_id: BatchId,
    #[serde(flatten)]
    pub progress: BatchProgress,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a batch; processing continues in the background
pub async fn submit_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitBatchBody>,
) -> Result<(StatusCode, Json<SubmitBatchResponse>), ApiError> {
    let items: Vec<WorkItem> = body.songs.into_iter().map(WorkItem::from).collect();
    let total = items.len();

    let batch_id = state.orchestrator().submit(items)?;
    info!(batch_id = %batch_id, total, "Accepted batch submission");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitBatchResponse { batch_id, total }),
    ))
}

/// Get progress of a batch
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BatchProgressResponse>, ApiError> {
    let batch_id = BatchId::from(id);
    let progress = state.orchestrator().progress(&batch_id)?;
    Ok(Json(BatchProgressResponse { batch_id, progress }))
}

/// Download the zip of a completed batch. The batch is gone afterwards.
pub async fn download_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let batch_id = BatchId::from(id);
    let stream = state.orchestrator().archive(&batch_id).await?;
    Ok(attachment_response(stream))
}
