use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::batch::{BatchId, BatchRegistry};
use crate::metrics::CLEANUP_FAILURES;

/// Removes transient artifacts when dropped.
///
/// Owned by whatever is delivering the artifact (normally an
/// [`ArtifactStream`](super::ArtifactStream)), so release happens after the
/// last byte is sent, when the client disconnects, or when building fails.
/// Failures are logged and counted, never propagated.
#[derive(Default)]
pub struct CleanupGuard {
    dirs: Vec<PathBuf>,
    files: Vec<PathBuf>,
    registry_entry: Option<(Arc<BatchRegistry>, BatchId)>,
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `dir` recursively on release.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    /// Removes `file` on release.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.files.push(file.into());
        self
    }

    /// Drops the batch from the registry on release.
    pub fn with_registry_entry(mut self, registry: Arc<BatchRegistry>, id: BatchId) -> Self {
        self.registry_entry = Some((registry, id));
        self
    }

    fn release(&mut self) {
        for file in self.files.drain(..) {
            match std::fs::remove_file(&file) {
                Ok(()) => debug!(path = %file.display(), "Removed artifact"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    CLEANUP_FAILURES.inc();
                    warn!(path = %file.display(), error = %e, "Failed to remove artifact");
                }
            }
        }

        for dir in self.dirs.drain(..) {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => debug!(path = %dir.display(), "Removed directory"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    CLEANUP_FAILURES.inc();
                    warn!(path = %dir.display(), error = %e, "Failed to remove directory");
                }
            }
        }

        if let Some((registry, id)) = self.registry_entry.take() {
            registry.remove(&id);
            debug!(batch_id = %id, "Removed batch from registry");
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.release();
    }
}
