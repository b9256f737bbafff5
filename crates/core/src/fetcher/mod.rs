//! Fetcher module for retrieving individual media items.
//!
//! This module provides the `ItemFetcher` trait, the seam the batch runner
//! calls for every work item, and `YtDlpFetcher`, which searches for the
//! item with yt-dlp and extracts audio through ffmpeg.
//!
//! # Example
//!
//! ```ignore
//! use tunebatch_core::fetcher::{FetcherConfig, ItemFetcher, YtDlpFetcher};
//!
//! let fetcher = YtDlpFetcher::new(FetcherConfig::default());
//! fetcher.validate().await?;
//!
//! let path = fetcher
//!     .fetch("Song Artist official audio", "Song - Artist.mp3", Path::new("/tmp/out"))
//!     .await?;
//! ```

mod config;
mod error;
mod traits;
mod ytdlp;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use traits::ItemFetcher;
pub use ytdlp::YtDlpFetcher;
