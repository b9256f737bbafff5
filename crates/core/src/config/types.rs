use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::catalog::SpotifyConfig;
use crate::fetcher::FetcherConfig;
use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub spotify: Option<SpotifyConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with a static web UI, served as fallback for non-API routes
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Where batch output, archives and scratch directories live
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Suggested file name for batch archives
    #[serde(default = "default_archive_name")]
    pub archive_download_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            archive_download_name: default_archive_name(),
        }
    }
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("tunebatch")
}

fn default_archive_name() -> String {
    "playlist_songs.zip".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub fetcher: FetcherConfig,
    pub orchestrator: OrchestratorConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify: Option<SanitizedSpotifyConfig>,
}

/// Sanitized Spotify config (client secret hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSpotifyConfig {
    pub client_id: String,
    pub client_secret_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            fetcher: config.fetcher.clone(),
            orchestrator: config.orchestrator.clone(),
            spotify: config.spotify.as_ref().map(|s| SanitizedSpotifyConfig {
                client_id: s.client_id.clone(),
                client_secret_configured: !s.client_secret.is_empty(),
                timeout_secs: s.timeout_secs,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.server.static_dir.is_none());
        assert_eq!(config.storage.archive_download_name, "playlist_songs.zip");
        assert!(config.spotify.is_none());
    }

    #[test]
    fn test_deserialize_server_section() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
static_dir = "web/dist"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(
            config.server.static_dir.unwrap().to_str().unwrap(),
            "web/dist"
        );
    }

    #[test]
    fn test_deserialize_with_custom_storage() {
        let toml = r#"
[storage]
work_dir = "/data/tunebatch"
archive_download_name = "songs.zip"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.work_dir.to_str().unwrap(), "/data/tunebatch");
        assert_eq!(config.storage.archive_download_name, "songs.zip");
    }

    #[test]
    fn test_deserialize_with_spotify_config() {
        let toml = r#"
[spotify]
client_id = "id-123"
client_secret = "secret-456"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let spotify = config.spotify.as_ref().unwrap();
        assert_eq!(spotify.client_id, "id-123");
        assert_eq!(spotify.client_secret, "secret-456");
        assert_eq!(spotify.timeout_secs, 30);
    }

    #[test]
    fn test_sanitized_config_without_spotify() {
        let config = Config::default();
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.server.port, 8080);
        assert!(sanitized.spotify.is_none());
    }

    #[test]
    fn test_sanitized_config_hides_client_secret() {
        let config = Config {
            spotify: Some(SpotifyConfig {
                client_id: "id-123".to_string(),
                client_secret: "very-secret".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let sanitized = SanitizedConfig::from(&config);
        let spotify = sanitized.spotify.as_ref().unwrap();
        assert_eq!(spotify.client_id, "id-123");
        assert!(spotify.client_secret_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("very-secret"));
    }
}
