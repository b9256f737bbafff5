//! In-memory registry of batches and their progress.
//!
//! Each entry holds the receiving side of a `watch` channel. The batch's
//! runner owns the only [`ProgressWriter`], so every update is a whole
//! snapshot swap by a single writer and readers never see a torn record.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::BatchError;
use super::types::{BatchId, BatchProgress, BatchStatus, ItemFailure};

struct Entry {
    progress: watch::Receiver<BatchProgress>,
    output_dir: PathBuf,
    cancel: CancellationToken,
    archiving: bool,
}

/// A freshly registered batch.
pub struct NewBatch {
    pub id: BatchId,
    pub output_dir: PathBuf,
    pub writer: ProgressWriter,
}

/// Process-wide table of batches.
#[derive(Default)]
pub struct BatchRegistry {
    entries: RwLock<HashMap<BatchId, Entry>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new running batch of `total` items.
    ///
    /// The output directory is `{work_dir}/batch_{id}`; it is not created
    /// here.
    pub fn create(&self, total: usize, work_dir: &Path, cancel: CancellationToken) -> NewBatch {
        let id = BatchId::new();
        let output_dir = work_dir.join(format!("batch_{}", id));
        let (tx, rx) = watch::channel(BatchProgress::new(total));

        let entry = Entry {
            progress: rx,
            output_dir: output_dir.clone(),
            cancel,
            archiving: false,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), entry);

        debug!(batch_id = %id, total, "Registered batch");

        NewBatch {
            id,
            output_dir,
            writer: ProgressWriter { tx },
        }
    }

    /// Consistent snapshot of a batch's progress.
    pub fn get(&self, id: &BatchId) -> Result<BatchProgress, BatchError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(id)
            .map(|entry| entry.progress.borrow().clone())
            .ok_or_else(|| BatchError::NotFound(id.clone()))
    }

    /// Subscribes to progress changes of a batch.
    pub fn subscribe(&self, id: &BatchId) -> Result<watch::Receiver<BatchProgress>, BatchError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(id)
            .map(|entry| entry.progress.clone())
            .ok_or_else(|| BatchError::NotFound(id.clone()))
    }

    /// Reserves a completed batch for archiving.
    ///
    /// Returns the batch's output directory. Only one claim can succeed per
    /// batch; the entry is removed by the archive's cleanup.
    pub fn claim_for_archive(&self, id: &BatchId) -> Result<PathBuf, BatchError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| BatchError::NotFound(id.clone()))?;

        if entry.progress.borrow().status != BatchStatus::Completed {
            return Err(BatchError::NotReady(id.clone()));
        }
        if entry.archiving {
            return Err(BatchError::ArchiveInProgress(id.clone()));
        }

        entry.archiving = true;
        Ok(entry.output_dir.clone())
    }

    /// Removes a batch. Returns whether it existed.
    pub fn remove(&self, id: &BatchId) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);

        if let Some(entry) = removed {
            // A running batch stops starting new items once forgotten
            entry.cancel.cancel();
            true
        } else {
            false
        }
    }

    /// Removes terminal, unclaimed batches that finished before `cutoff`.
    ///
    /// Selection and removal happen under one write lock, so a batch being
    /// reaped can no longer be claimed for archiving. Returns the removed ids
    /// with their output directories.
    pub fn remove_expired(&self, cutoff: DateTime<Utc>) -> Vec<(BatchId, PathBuf)> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        let expired: Vec<BatchId> = entries
            .iter()
            .filter(|(_, entry)| !entry.archiving)
            .filter(|(_, entry)| {
                let progress = entry.progress.borrow();
                progress.status.is_terminal()
                    && progress.finished_at.unwrap_or(progress.created_at) < cutoff
            })
            .map(|(id, _)| id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| entries.remove(&id).map(|entry| (id, entry.output_dir)))
            .collect()
    }

    /// Count of batches per status, plus how many are being archived.
    pub fn counts(&self) -> RegistryCounts {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut counts = RegistryCounts::default();
        for entry in entries.values() {
            match entry.progress.borrow().status {
                BatchStatus::Running => counts.running += 1,
                BatchStatus::Completed => counts.completed += 1,
                BatchStatus::Cancelled => counts.cancelled += 1,
            }
            if entry.archiving {
                counts.archiving += 1;
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Batch counts by lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryCounts {
    pub running: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub archiving: usize,
}

/// Exclusive write access to one batch's progress.
///
/// Not `Clone`: the batch runner is the only writer.
pub struct ProgressWriter {
    tx: watch::Sender<BatchProgress>,
}

impl ProgressWriter {
    /// Marks `item` as the one currently being processed.
    pub fn set_current(&self, item: &str) {
        self.tx.send_modify(|progress| {
            progress.current_item = item.to_string();
        });
    }

    /// Records a successful item.
    pub fn record_success(&self) {
        self.tx.send_modify(|progress| {
            if progress.attempted() < progress.total {
                progress.completed += 1;
            } else {
                warn!("Ignoring success beyond batch total");
            }
        });
    }

    /// Records a failed item with its error text.
    pub fn record_failure(&self, item: &str, error: &str) {
        self.tx.send_modify(|progress| {
            if progress.attempted() < progress.total {
                progress.failures.push(ItemFailure {
                    item: item.to_string(),
                    error: error.to_string(),
                });
            } else {
                warn!(item = %item, "Ignoring failure beyond batch total");
            }
        });
    }

    /// Current snapshot as seen by the writer.
    pub fn snapshot(&self) -> BatchProgress {
        self.tx.borrow().clone()
    }

    /// Moves the batch to its terminal status. Consumes the writer, so this
    /// is always the last mutation.
    pub fn finish(self, status: BatchStatus) -> BatchProgress {
        self.tx.send_modify(|progress| {
            progress.status = status;
            progress.finished_at = Some(Utc::now());
        });
        self.snapshot()
    }
}
