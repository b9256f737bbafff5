//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching one item.
#[derive(Debug, Error)]
pub enum FetchError {
    /// yt-dlp binary not found.
    #[error("yt-dlp not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The tool finished but no file with the expected base name appeared.
    #[error("File was not produced.")]
    NotProduced,

    /// The tool exited unsuccessfully, e.g. no search match.
    #[error("{reason}")]
    ToolFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The fetch did not finish in time.
    #[error("Fetch timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error around the fetch.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Creates a tool failure with optional stderr output.
    pub fn tool_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ToolFailed {
            reason: reason.into(),
            stderr,
        }
    }
}
