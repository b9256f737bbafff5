use serde::{Deserialize, Serialize};

use crate::batch::WorkItem;

/// A resolved playlist, ready to be submitted as a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub name: String,
    pub description: String,
    pub songs: Vec<PlaylistTrack>,
    pub total: usize,
}

/// One track of a resolved playlist with its derived query and file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    /// 1-based position in the playlist (after skipped entries).
    pub id: usize,
    pub title: String,
    pub artist: String,
    pub search_query: String,
    pub filename: String,
}

impl PlaylistTrack {
    pub fn new(id: usize, title: impl Into<String>, artist: impl Into<String>) -> Self {
        let item = WorkItem::new(title, artist);
        Self {
            id,
            title: item.title,
            artist: item.source_identifier,
            search_query: item.search_query,
            filename: item.desired_filename,
        }
    }
}

impl From<PlaylistTrack> for WorkItem {
    fn from(track: PlaylistTrack) -> Self {
        WorkItem {
            title: track.title,
            source_identifier: track.artist,
            search_query: track.search_query,
            desired_filename: track.filename,
        }
    }
}

impl PlaylistInfo {
    /// Builds playlist info from `(title, artist)` pairs, numbering from 1.
    pub fn from_tracks(
        name: impl Into<String>,
        description: impl Into<String>,
        tracks: Vec<(String, String)>,
    ) -> Self {
        let songs: Vec<PlaylistTrack> = tracks
            .into_iter()
            .enumerate()
            .map(|(idx, (title, artist))| PlaylistTrack::new(idx + 1, title, artist))
            .collect();

        Self {
            name: name.into(),
            description: description.into(),
            total: songs.len(),
            songs,
        }
    }
}
