//! Mock playlist catalog for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use crate::catalog::{extract_playlist_id, CatalogError, PlaylistCatalog, PlaylistInfo};

/// Mock implementation of the PlaylistCatalog trait.
///
/// Playlists are registered by id; unknown ids resolve to `NotFound`,
/// ids marked private to `Private`.
#[derive(Debug, Default)]
pub struct MockPlaylistCatalog {
    playlists: RwLock<HashMap<String, PlaylistInfo>>,
    private: RwLock<HashSet<String>>,
    requests: RwLock<Vec<String>>,
}

impl MockPlaylistCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a playlist under `playlist_id`.
    pub fn add_playlist(&self, playlist_id: impl Into<String>, info: PlaylistInfo) {
        self.playlists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(playlist_id.into(), info);
    }

    /// Make `playlist_id` resolve as private.
    pub fn set_private(&self, playlist_id: impl Into<String>) {
        self.private
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(playlist_id.into());
    }

    /// URLs passed to `resolve`, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PlaylistCatalog for MockPlaylistCatalog {
    async fn resolve(&self, playlist_url: &str) -> Result<PlaylistInfo, CatalogError> {
        self.requests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(playlist_url.to_string());

        let id = extract_playlist_id(playlist_url).ok_or(CatalogError::InvalidUrl)?;

        if self
            .private
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
        {
            return Err(CatalogError::Private);
        }

        self.playlists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }
}
