pub mod archive;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod fetcher;
pub mod metrics;
pub mod orchestrator;
pub mod sanitize;
pub mod testing;

pub use archive::{build_archive, ArchiveSummary, ArtifactStream, CleanupGuard};
pub use batch::{
    BatchError, BatchId, BatchProgress, BatchRegistry, BatchStatus, ItemFailure, WorkItem,
};
pub use catalog::{
    extract_playlist_id, CatalogError, PlaylistCatalog, PlaylistInfo, PlaylistTrack,
    SpotifyCatalog, SpotifyConfig,
};
pub use config::{
    config_path_from_env, load_config, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig, ServerConfig, StorageConfig,
};
pub use fetcher::{FetchError, FetcherConfig, ItemFetcher, YtDlpFetcher};
pub use orchestrator::{
    BatchOrchestrator, OrchestratorConfig, OrchestratorStatus, SingleFetchRequest,
};
pub use sanitize::sanitize_filename;
