use std::sync::Arc;
use tunebatch_core::{BatchOrchestrator, Config, PlaylistCatalog, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<BatchOrchestrator>,
    catalog: Option<Arc<dyn PlaylistCatalog>>,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<BatchOrchestrator>,
        catalog: Option<Arc<dyn PlaylistCatalog>>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            catalog,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &Arc<BatchOrchestrator> {
        &self.orchestrator
    }

    /// Playlist catalog, absent when no Spotify credentials are configured.
    pub fn catalog(&self) -> Option<&Arc<dyn PlaylistCatalog>> {
        self.catalog.as_ref()
    }
}
