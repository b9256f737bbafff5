//! Playlist catalog integration.
//!
//! Resolves a playlist URL into display metadata and the work items a batch
//! can be submitted with. `SpotifyCatalog` talks to the Spotify Web API
//! using the client-credentials flow.

mod spotify;
mod types;

pub use spotify::{SpotifyCatalog, SpotifyConfig};
pub use types::{PlaylistInfo, PlaylistTrack};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;

/// Errors that can occur when resolving a playlist.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// URL does not contain a playlist identifier.
    #[error("Invalid Spotify playlist URL.")]
    InvalidUrl,

    /// Playlist exists but is not readable with app credentials (403).
    #[error("Playlist is private.")]
    Private,

    /// Playlist does not exist (404).
    #[error("Playlist not found: {0}")]
    NotFound(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error.
    #[error("Spotify error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Token request was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Source of playlist metadata.
#[async_trait]
pub trait PlaylistCatalog: Send + Sync {
    /// Resolves a playlist URL (or URI) into its tracks.
    async fn resolve(&self, playlist_url: &str) -> Result<PlaylistInfo, CatalogError>;
}

static PLAYLIST_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:playlist/|playlist:)([a-zA-Z0-9]+)").expect("playlist id pattern is valid")
});

/// Extracts the playlist identifier from a URL or `spotify:playlist:` URI.
pub fn extract_playlist_id(url: &str) -> Option<String> {
    PLAYLIST_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
