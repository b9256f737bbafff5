//! Spotify Web API client.
//!
//! Uses the client-credentials flow: an app token is requested from the
//! accounts service and cached until shortly before it expires.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::types::PlaylistInfo;
use super::{extract_playlist_id, CatalogError, PlaylistCatalog};
use crate::metrics::EXTERNAL_SERVICE_REQUESTS;

/// Page size for playlist item requests (API maximum).
const PAGE_LIMIT: usize = 100;

/// Tokens are refreshed this long before their reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Spotify client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Playlist catalog backed by the Spotify Web API.
pub struct SpotifyCatalog {
    client: Client,
    config: SpotifyConfig,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyCatalog {
    /// Create a new Spotify client.
    pub fn new(config: SpotifyConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(concat!("tunebatch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    /// Returns a valid app token, requesting a new one when needed.
    async fn access_token(&self) -> Result<String, CatalogError> {
        let mut cached = self.token.lock().await;

        if let Some(ref token) = *cached {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Spotify access token");
        let response = self
            .client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        record_request("token", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Spotify token request rejected");
            return Err(CatalogError::Auth(format!("{} - {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(format!("Failed to parse token response: {}", e)))?;

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(value)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }

    /// Performs an authorized GET and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        playlist_id: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        record_request(operation, status);

        if status == StatusCode::UNAUTHORIZED {
            self.forget_token().await;
        }

        let response = check_status(response, playlist_id).await?;
        response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(format!("Failed to parse {} response: {}", operation, e)))
    }

    /// Reads every playlist entry, page by page.
    async fn fetch_all_tracks(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<(String, String)>, CatalogError> {
        let url = format!("{}/playlists/{}/tracks", self.config.api_base_url, playlist_id);
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let page: TracksPage = self
                .get_json(
                    "playlist_tracks",
                    playlist_id,
                    &url,
                    &[
                        ("limit", PAGE_LIMIT.to_string()),
                        ("offset", offset.to_string()),
                        (
                            "fields",
                            "items(track(name,artists(name))),next".to_string(),
                        ),
                    ],
                )
                .await?;

            tracks.extend(page.items.into_iter().filter_map(PlaylistItem::into_title_artist));

            if page.next.is_none() {
                break;
            }
            offset += PAGE_LIMIT;
        }

        Ok(tracks)
    }
}

#[async_trait]
impl PlaylistCatalog for SpotifyCatalog {
    async fn resolve(&self, playlist_url: &str) -> Result<PlaylistInfo, CatalogError> {
        let playlist_id = extract_playlist_id(playlist_url).ok_or(CatalogError::InvalidUrl)?;

        let meta: PlaylistMeta = self
            .get_json(
                "playlist",
                &playlist_id,
                &format!("{}/playlists/{}", self.config.api_base_url, playlist_id),
                &[("fields", "name,description".to_string())],
            )
            .await?;

        let tracks = self.fetch_all_tracks(&playlist_id).await?;

        info!(
            playlist_id = %playlist_id,
            tracks = tracks.len(),
            "Resolved Spotify playlist"
        );

        Ok(PlaylistInfo::from_tracks(
            meta.name.unwrap_or_else(|| "Playlist".to_string()),
            meta.description.unwrap_or_default(),
            tracks,
        ))
    }
}

fn record_request(operation: &str, status: StatusCode) {
    let label = if status.is_success() { "success" } else { "error" };
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&["spotify", operation, label])
        .inc();
}

/// Maps non-success responses to catalog errors.
async fn check_status(response: Response, playlist_id: &str) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::FORBIDDEN => Err(CatalogError::Private),
        StatusCode::NOT_FOUND => Err(CatalogError::NotFound(playlist_id.to_string())),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(CatalogError::Api {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}

// Spotify API response types

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct PlaylistMeta {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TracksPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    name: Option<String>,
    #[serde(default)]
    artists: Option<Vec<Option<ArtistObject>>>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: Option<String>,
}

impl PlaylistItem {
    /// Title and joined artist names; `None` for unusable entries
    /// (removed tracks, local files without metadata).
    fn into_title_artist(self) -> Option<(String, String)> {
        let track = self.track?;
        let title = track.name.filter(|n| !n.is_empty())?;

        let artists: Vec<String> = track
            .artists
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|a| a.name)
            .filter(|n| !n.is_empty())
            .collect();
        if artists.is_empty() {
            return None;
        }

        Some((title, artists.join(", ")))
    }
}
