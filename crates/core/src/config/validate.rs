use super::{types::Config, ConfigError};
use crate::orchestrator::MAX_BATCH_TTL_SECS;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Fetch pool and per-batch concurrency are at least 1
/// - Batch TTL is at most ten years
/// - Spotify credentials are non-empty when the section is present
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.orchestrator.max_concurrent_fetches == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_concurrent_fetches must be at least 1".to_string(),
        ));
    }

    if config.orchestrator.item_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.item_concurrency must be at least 1".to_string(),
        ));
    }

    if config.orchestrator.batch_ttl_secs > MAX_BATCH_TTL_SECS {
        return Err(ConfigError::ValidationError(format!(
            "orchestrator.batch_ttl_secs must be at most {}",
            MAX_BATCH_TTL_SECS
        )));
    }

    if config.fetcher.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.storage.archive_download_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.archive_download_name cannot be empty".to_string(),
        ));
    }

    if let Some(spotify) = &config.spotify {
        if spotify.client_id.is_empty() || spotify.client_secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "spotify.client_id and spotify.client_secret must both be set".to_string(),
            ));
        }
    }

    Ok(())
}
