//! Orchestrator API handlers.

use axum::{extract::State, Json};
use std::sync::Arc;
use tunebatch_core::OrchestratorStatus;

use crate::state::AppState;

/// Get orchestrator status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<OrchestratorStatus> {
    Json(state.orchestrator().status())
}
