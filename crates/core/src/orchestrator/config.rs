//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Largest accepted `batch_ttl_secs` (ten years).
pub const MAX_BATCH_TTL_SECS: u64 = 10 * 365 * 86_400;

/// Configuration for the batch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum fetches running at once across all batches and single-item
    /// requests.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Items of one batch processed at the same time.
    /// 1 keeps a batch strictly sequential in submission order.
    #[serde(default = "default_item_concurrency")]
    pub item_concurrency: usize,

    /// Finished batches are forgotten (and their files removed) this many
    /// seconds after finishing, unless archived first (0 = never).
    #[serde(default = "default_batch_ttl")]
    pub batch_ttl_secs: u64,

    /// How often the expiry sweep runs (seconds).
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,

    /// How long shutdown waits for running batches to wind down (seconds).
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_item_concurrency() -> usize {
    1
}

fn default_batch_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_reap_interval() -> u64 {
    300 // 5 minutes
}

fn default_shutdown_grace() -> u64 {
    10
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            item_concurrency: default_item_concurrency(),
            batch_ttl_secs: default_batch_ttl(),
            reap_interval_secs: default_reap_interval(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}
