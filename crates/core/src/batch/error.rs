//! Error types for batch operations.

use thiserror::Error;

use super::types::BatchId;
use crate::fetcher::FetchError;

/// Errors surfaced to callers of the batch operations.
///
/// Per-item fetch failures inside a batch are recorded in its progress and
/// never surface through this type; `ItemFailure` is only returned by the
/// single-item path.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Malformed submission.
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown batch identifier.
    #[error("batch not found: {0}")]
    NotFound(BatchId),

    /// Archive requested before the batch completed.
    #[error("batch not completed yet: {0}")]
    NotReady(BatchId),

    /// Another request is already streaming this batch's archive.
    #[error("archive already in progress for batch: {0}")]
    ArchiveInProgress(BatchId),

    /// Single-item fetch failed.
    #[error("Download failed: {0}")]
    ItemFailure(#[from] FetchError),

    /// Building the archive failed.
    #[error("archive failed: {0}")]
    Archive(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for BatchError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}
