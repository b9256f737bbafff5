//! Batch orchestrator: entry point for submitting, polling and collecting
//! batches, and for one-off single item fetches.

use std::io;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use tokio::sync::{broadcast, watch, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::config::OrchestratorConfig;
use super::types::{OrchestratorStatus, SingleFetchRequest};
use crate::archive::{build_archive, ArtifactStream, CleanupGuard};
use crate::batch::{
    prepare_items, BatchError, BatchId, BatchProgress, BatchRegistry, BatchRunner, FetchContext,
    WorkItem, DEFAULT_EXTENSION,
};
use crate::config::StorageConfig;
use crate::fetcher::{FetchError, ItemFetcher};
use crate::metrics::{ARCHIVES_SERVED, BATCHES_REAPED, BATCHES_SUBMITTED, SINGLE_FETCHES};
use crate::sanitize::sanitize_filename;

/// Drives batches from submission to archive.
pub struct BatchOrchestrator {
    config: OrchestratorConfig,
    storage: StorageConfig,
    fetch: FetchContext,
    registry: Arc<BatchRegistry>,

    // Runtime state
    running: Arc<AtomicBool>,
    root_cancel: CancellationToken,
    tasks: TaskTracker,
    shutdown_tx: broadcast::Sender<()>,
}

impl BatchOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        storage: StorageConfig,
        fetcher: Arc<dyn ItemFetcher>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let fetch = FetchContext {
            fetcher,
            fetch_slots: Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1))),
            item_concurrency: config.item_concurrency.max(1),
        };

        Self {
            config,
            storage,
            fetch,
            registry: Arc::new(BatchRegistry::new()),
            running: Arc::new(AtomicBool::new(false)),
            root_cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
            shutdown_tx,
        }
    }

    pub fn registry(&self) -> &Arc<BatchRegistry> {
        &self.registry
    }

    /// Start background maintenance (the expiry sweep).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        info!(work_dir = %self.storage.work_dir.display(), "Starting batch orchestrator");

        if let Err(e) = tokio::fs::create_dir_all(&self.storage.work_dir).await {
            warn!(
                work_dir = %self.storage.work_dir.display(),
                error = %e,
                "Failed to create work directory"
            );
        }

        if self.config.batch_ttl_secs > 0 {
            self.spawn_reaper_loop();
        } else {
            info!("Batch expiry disabled (batch_ttl_secs = 0)");
        }

        info!("Batch orchestrator started");
    }

    /// Stop gracefully: cancel running batches and wait for them to settle.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("Orchestrator maintenance was not running");
        }

        info!("Stopping batch orchestrator");

        let _ = self.shutdown_tx.send(());
        self.root_cancel.cancel();
        self.tasks.close();

        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        if tokio::time::timeout(grace, self.tasks.wait()).await.is_err() {
            warn!(
                remaining = self.tasks.len(),
                "Batches still running after shutdown grace period"
            );
        }

        info!("Batch orchestrator stopped");
    }

    /// Registers a batch and starts processing it in the background.
    ///
    /// Returns as soon as the batch is registered.
    pub fn submit(&self, items: Vec<WorkItem>) -> Result<BatchId, BatchError> {
        let items = prepare_items(items)?;

        let cancel = self.root_cancel.child_token();
        let batch = self
            .registry
            .create(items.len(), &self.storage.work_dir, cancel.clone());
        let id = batch.id.clone();

        BATCHES_SUBMITTED.inc();
        info!(batch_id = %id, items = items.len(), "Batch submitted");

        let runner = BatchRunner::new(batch, items, self.fetch.clone(), cancel);
        self.tasks.spawn(async move {
            runner.run().await;
        });

        Ok(id)
    }

    /// Consistent snapshot of a batch's progress.
    pub fn progress(&self, id: &BatchId) -> Result<BatchProgress, BatchError> {
        self.registry.get(id)
    }

    /// Subscribes to a batch's progress updates.
    pub fn watch(&self, id: &BatchId) -> Result<watch::Receiver<BatchProgress>, BatchError> {
        self.registry.subscribe(id)
    }

    /// Packs a completed batch into a zip and returns it as a stream.
    ///
    /// The batch's directory, the zip and the registry entry are removed
    /// when the returned stream is dropped, or right away if packing fails.
    pub async fn archive(&self, id: &BatchId) -> Result<ArtifactStream, BatchError> {
        let output_dir = self.registry.claim_for_archive(id)?;
        let archive_path = self.storage.work_dir.join(format!("batch_{}.zip", id));

        let guard = CleanupGuard::new()
            .with_dir(&output_dir)
            .with_file(&archive_path)
            .with_registry_entry(Arc::clone(&self.registry), id.clone());

        let summary = {
            let source = output_dir.clone();
            let target = archive_path.clone();
            tokio::task::spawn_blocking(move || build_archive(&source, &target))
                .await
                .map_err(|e| BatchError::Archive(format!("archive task failed: {}", e)))??
        };

        let stream = ArtifactStream::open(
            &archive_path,
            self.storage.archive_download_name.clone(),
            guard,
        )
        .await?;

        ARCHIVES_SERVED.inc();
        info!(
            batch_id = %id,
            entries = summary.entries.len(),
            renamed = summary.renamed,
            bytes = stream.content_length(),
            "Serving batch archive"
        );

        Ok(stream)
    }

    /// Fetches one item into a private scratch directory and returns it as
    /// a stream. The scratch directory is removed on every exit path.
    pub async fn fetch_single(
        &self,
        request: SingleFetchRequest,
    ) -> Result<ArtifactStream, BatchError> {
        if request.query.trim().is_empty() || request.filename.trim().is_empty() {
            return Err(BatchError::InvalidInput(
                "Missing query or filename".to_string(),
            ));
        }

        let scratch = self
            .storage
            .work_dir
            .join(format!("single_{}", uuid::Uuid::new_v4().simple()));
        let guard = CleanupGuard::new().with_dir(&scratch);

        let fetched = {
            let _permit = self
                .fetch
                .fetch_slots
                .acquire()
                .await
                .map_err(|_| io::Error::other("fetch pool closed"))?;

            AssertUnwindSafe(
                self.fetch
                    .fetcher
                    .fetch(&request.query, &request.filename, &scratch),
            )
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(FetchError::tool_failed("fetcher panicked", None)))
        };

        let path = match fetched {
            Ok(path) => path,
            Err(e) => {
                SINGLE_FETCHES.with_label_values(&["failed"]).inc();
                warn!(query = %request.query, error = %e, "Single fetch failed");
                return Err(BatchError::ItemFailure(e));
            }
        };

        let name = single_download_name(
            request.title.as_deref(),
            request.artist.as_deref(),
            &path,
        );
        let stream = ArtifactStream::open(&path, name, guard).await?;

        SINGLE_FETCHES.with_label_values(&["success"]).inc();
        info!(
            query = %request.query,
            download_name = %stream.download_name(),
            bytes = stream.content_length(),
            "Serving single item"
        );

        Ok(stream)
    }

    /// Removes finished batches older than the configured time-to-live.
    /// Returns how many were removed.
    pub fn reap_expired(&self) -> usize {
        Self::reap(&self.registry, self.config.batch_ttl_secs)
    }

    /// Get current orchestrator status.
    pub fn status(&self) -> OrchestratorStatus {
        let counts = self.registry.counts();

        OrchestratorStatus {
            running: self.running.load(Ordering::Relaxed),
            fetcher: self.fetch.fetcher.name().to_string(),
            running_batches: counts.running,
            completed_batches: counts.completed,
            cancelled_batches: counts.cancelled,
            archiving_batches: counts.archiving,
            fetch_slots_total: self.config.max_concurrent_fetches.max(1),
            fetch_slots_available: self.fetch.fetch_slots.available_permits(),
        }
    }

    fn reap(registry: &Arc<BatchRegistry>, ttl_secs: u64) -> usize {
        let Some(cutoff) = expiry_cutoff(Utc::now(), ttl_secs) else {
            return 0;
        };
        let removed = registry.remove_expired(cutoff);

        for (id, output_dir) in &removed {
            let archive_path = output_dir.with_extension("zip");
            drop(
                CleanupGuard::new()
                    .with_dir(output_dir)
                    .with_file(archive_path),
            );
            info!(batch_id = %id, "Expired batch removed");
        }

        BATCHES_REAPED.inc_by(removed.len() as u64);
        removed.len()
    }

    /// Spawn the expiry sweep loop task.
    fn spawn_reaper_loop(&self) {
        let running = Arc::clone(&self.running);
        let registry = Arc::clone(&self.registry);
        let ttl_secs = self.config.batch_ttl_secs;
        let interval = Duration::from_secs(self.config.reap_interval_secs.max(1));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(ttl_secs, "Expiry sweep started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Expiry sweep received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let removed = Self::reap(&registry, ttl_secs);
                        if removed > 0 {
                            debug!(removed, "Expiry sweep finished");
                        }
                    }
                }
            }
            info!("Expiry sweep stopped");
        });
    }
}

/// Batches that finished before the returned instant are expired.
/// `None` when the TTL reaches past the representable range: nothing expires.
fn expiry_cutoff(now: DateTime<Utc>, ttl_secs: u64) -> Option<DateTime<Utc>> {
    let ttl = TimeDelta::try_seconds(i64::try_from(ttl_secs).ok()?)?;
    now.checked_sub_signed(ttl)
}

/// Suggested name for a single-item download: `"{title} - {artist}"`
/// sanitized, falling back to `song`, with the produced file's extension.
fn single_download_name(title: Option<&str>, artist: Option<&str>, produced: &Path) -> String {
    let human = format!("{} - {}", title.unwrap_or(""), artist.unwrap_or(""));
    let base = sanitize_filename(human.trim_matches(|c| c == ' ' || c == '-'));
    let base = if base.is_empty() {
        "song".to_string()
    } else {
        base
    };

    let ext = produced
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(DEFAULT_EXTENSION);

    format!("{}.{}", base, ext)
}
