//! yt-dlp based fetcher implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::ItemFetcher;
use crate::metrics::{FETCH_DURATION, FETCH_REQUESTS};
use crate::sanitize::{sanitize_filename, split_extension};

/// Fetcher that searches and downloads audio with yt-dlp, converting it
/// through ffmpeg.
pub struct YtDlpFetcher {
    config: FetcherConfig,
}

impl YtDlpFetcher {
    /// Creates a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FetcherConfig::default())
    }

    /// Base name (without extension) the produced file will carry.
    fn output_stem(destination_name: &str) -> String {
        let (stem, _) = split_extension(destination_name);
        sanitize_filename(stem)
    }

    /// Builds yt-dlp arguments for one query.
    fn build_args(&self, query: &str, output_template: &Path) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            "bestaudio/best".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-progress".to_string(),
            "--default-search".to_string(),
            self.config.default_search.clone(),
            "--output".to_string(),
            output_template.to_string_lossy().to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--audio-quality".to_string(),
            self.config.audio_quality.clone(),
        ];

        if let Some(ref location) = self.config.ffmpeg_location {
            args.extend([
                "--ffmpeg-location".to_string(),
                location.to_string_lossy().to_string(),
            ]);
        }

        args.extend(self.config.extra_args.iter().cloned());

        // Terminate option parsing so queries starting with '-' are not flags
        args.push("--".to_string());
        args.push(query.to_string());

        args
    }

    /// Extracts a human readable reason from yt-dlp stderr.
    fn failure_reason(stderr: &str, code: Option<i32>) -> String {
        stderr
            .lines()
            .rev()
            .find(|line| line.contains("ERROR"))
            .map(|line| {
                line.trim()
                    .trim_start_matches("ERROR:")
                    .trim()
                    .to_string()
            })
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| format!("yt-dlp exited with code: {:?}", code))
    }

    /// Finds the produced file: the preferred extension first, otherwise any
    /// finished file sharing the base name.
    async fn locate_output(
        &self,
        directory: &Path,
        stem: &str,
    ) -> Result<PathBuf, FetchError> {
        let preferred = directory.join(format!("{}.{}", stem, self.config.audio_format));
        if tokio::fs::try_exists(&preferred).await.unwrap_or(false) {
            return Ok(preferred);
        }

        let prefix = format!("{}.", stem);
        let mut entries = tokio::fs::read_dir(directory).await?;
        let mut candidates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name.starts_with(&prefix)
                && !file_name.ends_with(".part")
                && !file_name.ends_with(".ytdl")
                && entry.file_type().await.map(|t| t.is_file()).unwrap_or(false)
            {
                candidates.push(entry.path());
            }
        }
        candidates.sort();

        candidates.into_iter().next().ok_or(FetchError::NotProduced)
    }
}

#[async_trait]
impl ItemFetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(
        &self,
        query: &str,
        destination_name: &str,
        directory: &Path,
    ) -> Result<PathBuf, FetchError> {
        let start = Instant::now();
        tokio::fs::create_dir_all(directory).await?;

        let stem = Self::output_stem(destination_name);
        let stem = if stem.is_empty() { "item".to_string() } else { stem };
        let output_template = directory.join(format!("{}.%(ext)s", stem));
        let args = self.build_args(query, &output_template);

        debug!(query = %query, stem = %stem, "Running yt-dlp");

        let child = Command::new(&self.config.yt_dlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::ToolNotFound {
                        path: self.config.yt_dlp_path.clone(),
                    }
                } else {
                    FetchError::Io(e)
                }
            })?;

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if output.status.success() {
                    self.locate_output(directory, &stem).await
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                    let reason = Self::failure_reason(&stderr, output.status.code());
                    Err(FetchError::tool_failed(
                        reason,
                        if stderr.is_empty() { None } else { Some(stderr) },
                    ))
                }
            }
            Ok(Err(e)) => Err(FetchError::Io(e)),
            // Dropping the wait future kills the child (kill_on_drop)
            Err(_) => Err(FetchError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }),
        };

        let status = if result.is_ok() { "success" } else { "error" };
        FETCH_REQUESTS.with_label_values(&[self.name(), status]).inc();
        FETCH_DURATION
            .with_label_values(&[status])
            .observe(start.elapsed().as_secs_f64());

        if let Err(ref e) = result {
            warn!(query = %query, error = %e, "yt-dlp fetch failed");
        }

        result
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let output = Command::new(&self.config.yt_dlp_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::ToolNotFound {
                        path: self.config.yt_dlp_path.clone(),
                    }
                } else {
                    FetchError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(FetchError::tool_failed(
                "yt-dlp --version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "yt-dlp available"
        );
        Ok(())
    }
}
