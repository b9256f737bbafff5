use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunebatch_core::{
    config_path_from_env, load_config, validate_config, BatchOrchestrator, ItemFetcher,
    PlaylistCatalog, SpotifyCatalog, YtDlpFetcher,
};
use tunebatch_server::api::create_router;
use tunebatch_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = config_path_from_env();

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Work directory: {:?}", config.storage.work_dir);

    // Create fetcher. A missing yt-dlp only fails the fetches themselves,
    // so the server still comes up for status and playlist resolution.
    let fetcher: Arc<dyn ItemFetcher> = Arc::new(YtDlpFetcher::new(config.fetcher.clone()));
    match fetcher.validate().await {
        Ok(()) => info!("Using fetcher: {}", fetcher.name()),
        Err(e) => warn!("Fetcher {} is not ready: {}", fetcher.name(), e),
    }

    // Create playlist catalog if configured
    let catalog: Option<Arc<dyn PlaylistCatalog>> = match &config.spotify {
        Some(spotify_config) => match SpotifyCatalog::new(spotify_config.clone()) {
            Ok(client) => {
                info!("Initializing Spotify playlist catalog");
                Some(Arc::new(client))
            }
            Err(e) => {
                error!("Failed to create Spotify client: {}", e);
                None
            }
        },
        None => {
            info!("No playlist catalog configured");
            None
        }
    };

    // Create and start the batch orchestrator
    let orchestrator = Arc::new(BatchOrchestrator::new(
        config.orchestrator.clone(),
        config.storage.clone(),
        fetcher,
    ));
    orchestrator.start().await;

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&orchestrator),
        catalog,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Cancel whatever batches are still running
    info!("Stopping orchestrator...");
    orchestrator.stop().await;
    info!("Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
