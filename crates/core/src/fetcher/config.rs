//! Configuration for the fetcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp based fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,

    /// Directory containing ffmpeg/ffprobe, passed as `--ffmpeg-location`.
    /// When unset, yt-dlp looks them up on `PATH`.
    #[serde(default)]
    pub ffmpeg_location: Option<PathBuf>,

    /// Target audio codec for extraction.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Target audio quality (bitrate like "192K" or VBR level "0"-"10").
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Search prefix used for plain-text queries.
    #[serde(default = "default_search")]
    pub default_search: String,

    /// Timeout for a single item in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Additional arguments appended before the query.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192K".to_string()
}

fn default_search() -> String {
    "ytsearch".to_string()
}

fn default_timeout() -> u64 {
    600 // 10 minutes
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            ffmpeg_location: None,
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            default_search: default_search(),
            timeout_secs: default_timeout(),
            extra_args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.yt_dlp_path, PathBuf::from("yt-dlp"));
        assert!(config.ffmpeg_location.is_none());
        assert_eq!(config.audio_format, "mp3");
        assert_eq!(config.audio_quality, "192K");
        assert_eq!(config.default_search, "ytsearch");
        assert_eq!(config.timeout_secs, 600);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            ffmpeg_location = "/opt/ffmpeg/bin"
            audio_format = "opus"
        "#;
        let config: FetcherConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.ffmpeg_location,
            Some(PathBuf::from("/opt/ffmpeg/bin"))
        );
        assert_eq!(config.audio_format, "opus");
        assert_eq!(config.audio_quality, "192K");
    }
}
