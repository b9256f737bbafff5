//! Batch orchestrator.
//!
//! Owns the batch registry, the process-wide fetch slots and the background
//! batch tasks:
//! - **Submission**: returns immediately, the batch runs as its own task
//! - **Fetching**: at most `max_concurrent_fetches` at once across all batches
//! - **Collection**: completed batches are packed and streamed once, then removed
//! - **Expiry**: finished batches nobody collects are swept after `batch_ttl_secs`

mod config;
mod runner;
mod types;

pub use config::{OrchestratorConfig, MAX_BATCH_TTL_SECS};
pub use runner::BatchOrchestrator;
pub use types::{OrchestratorStatus, SingleFetchRequest};
