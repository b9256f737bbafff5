use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::fs::File;
use tokio_util::bytes::Bytes;
use tokio_util::io::ReaderStream;

use super::guard::CleanupGuard;

/// Chunked byte stream over a finished artifact.
///
/// Owns the [`CleanupGuard`] for the artifact, so the backing files and
/// registry entry are released when the stream is dropped: after the last
/// chunk, on client disconnect, or when the response is abandoned.
pub struct ArtifactStream {
    inner: ReaderStream<File>,
    download_name: String,
    content_length: u64,
    _guard: CleanupGuard,
}

impl ArtifactStream {
    /// Opens `path` for streaming. On failure the guard is dropped and
    /// cleanup runs immediately.
    pub async fn open(
        path: &Path,
        download_name: impl Into<String>,
        guard: CleanupGuard,
    ) -> io::Result<Self> {
        let file = File::open(path).await?;
        let content_length = file.metadata().await?.len();

        Ok(Self {
            inner: ReaderStream::new(file),
            download_name: download_name.into(),
            content_length,
            _guard: guard,
        })
    }

    /// File name suggested to the client.
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// MIME type derived from the download name's extension.
    pub fn content_type(&self) -> &'static str {
        let ext = Path::new(&self.download_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("zip") => "application/zip",
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            Some("opus") | Some("ogg") => "audio/ogg",
            Some("flac") => "audio/flac",
            Some("wav") => "audio/wav",
            Some("webm") => "audio/webm",
            _ => "application/octet-stream",
        }
    }
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}
