//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::FetchError;

/// Retrieves a single media item into a directory.
///
/// Implementations must create `directory` when it is absent and must report
/// "nothing found" as an `Err`, never by panicking. The produced file may
/// carry a different extension than the one in `destination_name`; callers
/// accept whatever file with the matching base name appears.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Fetches the best match for `query` and stores it as `destination_name`.
    ///
    /// Returns the final path of the produced file.
    async fn fetch(
        &self,
        query: &str,
        destination_name: &str,
        directory: &Path,
    ) -> Result<PathBuf, FetchError>;

    /// Validates that the fetcher is properly configured and ready.
    async fn validate(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
