//! Types for the batch orchestrator.

use serde::{Deserialize, Serialize};

/// Request to fetch one item outside any batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SingleFetchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filename: String,
    /// Used for the suggested download name.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether background maintenance is running.
    pub running: bool,
    /// Name of the fetcher in use.
    pub fetcher: String,
    pub running_batches: usize,
    pub completed_batches: usize,
    pub cancelled_batches: usize,
    /// Batches whose archive is currently being built or streamed.
    pub archiving_batches: usize,
    pub fetch_slots_total: usize,
    pub fetch_slots_available: usize,
}
