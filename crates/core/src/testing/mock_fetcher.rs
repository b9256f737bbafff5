//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::fetcher::{FetchError, ItemFetcher};
use crate::sanitize::{sanitize_filename, split_extension};

/// A recorded fetch call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub query: String,
    pub destination_name: String,
    pub directory: PathBuf,
}

/// Mock implementation of the ItemFetcher trait.
///
/// Provides controllable behavior for testing:
/// - Track fetch calls for assertions
/// - Fail or panic for specific queries
/// - Simulate slow fetches
/// - Observe peak concurrency
///
/// Successful fetches write a small file named after the destination into
/// the target directory, like a real fetcher would.
///
/// # Example
///
/// ```rust,ignore
/// use tunebatch_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new().with_delay(Duration::from_millis(20));
/// fetcher.fail_query("Song 2 Artist official audio", "no match found");
///
/// // Submit a batch using the fetcher...
///
/// assert_eq!(fetcher.calls().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    calls: Arc<RwLock<Vec<RecordedFetch>>>,
    failures: Arc<RwLock<HashMap<String, String>>>,
    panics: Arc<RwLock<HashSet<String>>>,
    delay: Duration,
    content: Vec<u8>,
    output_extension: Option<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    /// Create a new mock fetcher that succeeds instantly.
    pub fn new() -> Self {
        Self {
            content: b"mock audio".to_vec(),
            ..Default::default()
        }
    }

    /// Simulated duration of every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Bytes written into produced files.
    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = content.into();
        self
    }

    /// Produce files with this extension instead of the requested one.
    pub fn with_output_extension(mut self, ext: impl Into<String>) -> Self {
        self.output_extension = Some(ext.into());
        self
    }

    /// Make fetches of `query` fail with `message`.
    pub fn fail_query(&self, query: impl Into<String>, message: impl Into<String>) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query.into(), message.into());
    }

    /// Make fetches of `query` panic.
    pub fn panic_on_query(&self, query: impl Into<String>) {
        self.panics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query.into());
    }

    /// Get all recorded fetch calls, in call order.
    pub fn calls(&self) -> Vec<RecordedFetch> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Highest number of fetches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn failure_for(&self, query: &str) -> Option<String> {
        self.failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(query)
            .cloned()
    }

    fn should_panic(&self, query: &str) -> bool {
        self.panics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(query)
    }

    fn output_name(&self, destination_name: &str) -> String {
        let (stem, ext) = split_extension(destination_name);
        let stem = sanitize_filename(stem);
        let stem = if stem.is_empty() { "item".to_string() } else { stem };
        let ext = self
            .output_extension
            .as_deref()
            .or(ext)
            .unwrap_or("mp3");
        format!("{}.{}", stem, ext)
    }
}

/// Decrements the in-flight counter even when the fetch is cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemFetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        query: &str,
        destination_name: &str,
        directory: &Path,
    ) -> Result<PathBuf, FetchError> {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedFetch {
                query: query.to_string(),
                destination_name: destination_name.to_string(),
                directory: directory.to_path_buf(),
            });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        tokio::fs::create_dir_all(directory).await?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.should_panic(query) {
            panic!("mock fetcher panic for query: {}", query);
        }

        if let Some(message) = self.failure_for(query) {
            return Err(FetchError::tool_failed(message, None));
        }

        let path = directory.join(self.output_name(destination_name));
        tokio::fs::write(&path, &self.content).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mock_fetch_writes_file_and_records() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new().with_content("abc");

        let path = fetcher
            .fetch("q", "Song - Artist.mp3", dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("Song - Artist.mp3"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
        assert_eq!(fetcher.calls().len(), 1);
        assert_eq!(fetcher.calls()[0].query, "q");
        assert_eq!(fetcher.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_mock_fetch_configured_failure() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new();
        fetcher.fail_query("bad", "no match found");

        let err = fetcher.fetch("bad", "x.mp3", dir.path()).await.unwrap_err();
        assert_eq!(err.to_string(), "no match found");
        assert!(!dir.path().join("x.mp3").exists());
    }

    #[tokio::test]
    async fn test_mock_output_extension_override() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new().with_output_extension("m4a");

        let path = fetcher.fetch("q", "Song.mp3", dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("Song.m4a"));
    }
}
