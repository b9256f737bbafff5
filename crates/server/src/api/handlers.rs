use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tunebatch_core::{ArtifactStream, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus scrape endpoint.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// Streams an artifact to the client as a file attachment.
///
/// The artifact's cleanup runs when axum drops the body, which covers both
/// a completed transfer and a client that disconnects halfway.
pub fn attachment_response(stream: ArtifactStream) -> Response {
    let disposition = content_disposition(stream.download_name());
    let content_type = stream.content_type();
    let content_length = stream.content_length();

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    response
}

/// `attachment` disposition with an ASCII fallback name and the exact
/// UTF-8 name in `filename*`.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain_name() {
        assert_eq!(
            content_disposition("playlist_songs.zip"),
            "attachment; filename=\"playlist_songs.zip\"; filename*=UTF-8''playlist_songs.zip"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii_name() {
        let value = content_disposition("Café - Ñu.mp3");
        assert!(value.starts_with("attachment; filename=\"Caf_ - _u.mp3\""));
        assert!(value.ends_with("filename*=UTF-8''Caf%C3%A9%20-%20%C3%91u.mp3"));
    }
}
