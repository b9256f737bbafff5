//! Testing utilities and mock implementations.
//!
//! Mock implementations of the fetcher and playlist catalog traits, so
//! batches can be driven end to end without yt-dlp or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use tunebatch_core::testing::{fixtures, MockFetcher};
//!
//! let fetcher = Arc::new(MockFetcher::new());
//! fetcher.fail_query("Song 2 Artist official audio", "no match found");
//!
//! let orchestrator = BatchOrchestrator::new(config, storage, fetcher.clone());
//! let id = orchestrator.submit(fixtures::work_items(3))?;
//! ```

mod mock_catalog;
mod mock_fetcher;

pub use mock_catalog::MockPlaylistCatalog;
pub use mock_fetcher::{MockFetcher, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::batch::WorkItem;
    use crate::catalog::PlaylistInfo;

    /// `n` work items titled `Song 1..n` by `Artist`.
    pub fn work_items(n: usize) -> Vec<WorkItem> {
        (1..=n)
            .map(|i| WorkItem::new(format!("Song {}", i), "Artist"))
            .collect()
    }

    /// A playlist named `name` with `n` tracks matching [`work_items`].
    pub fn playlist(name: &str, n: usize) -> PlaylistInfo {
        PlaylistInfo::from_tracks(
            name,
            format!("{} tracks", n),
            (1..=n)
                .map(|i| (format!("Song {}", i), "Artist".to_string()))
                .collect(),
        )
    }
}
