//! End-to-end tests with mocked external dependencies.
//!
//! These tests run the full server stack in-process with mock implementations
//! for the song fetcher (yt-dlp) and the playlist catalog (Spotify).

mod common;

use std::io::Cursor;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestConfig, TestFixture};

fn zip_entry_names(raw: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(raw)).expect("valid zip");
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body["storage"]["archive_download_name"],
        "playlist_songs.zip"
    );
    assert!(response.body.get("spotify").is_none());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);

    let text = String::from_utf8(response.raw).unwrap();
    assert!(text.contains("tunebatch_http_requests_total"));
    assert!(text.contains("tunebatch_fetch_slots_available"));
}

#[tokio::test]
async fn test_metrics_label_routes_not_ids() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/batches/not-a-real-batch").await;
    fixture.get("/api/v1/batches/0123456789abcdef0123456789abcdef/archive").await;

    let text = String::from_utf8(fixture.get("/metrics").await.raw).unwrap();
    assert!(text.contains(r#"path="/api/v1/batches/{id}""#));
    assert!(text.contains(r#"path="/api/v1/batches/{id}/archive""#));
    assert!(!text.contains("not-a-real-batch"));
    assert!(!text.contains("0123456789abcdef0123456789abcdef"));
}

#[tokio::test]
async fn test_orchestrator_status() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/orchestrator/status").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["fetcher"], "mock");
    assert_eq!(response.body["fetch_slots_total"], 4);
    assert_eq!(response.body["fetch_slots_available"], 4);
    assert_eq!(response.body["running_batches"], 0);
}

// =============================================================================
// Playlist Resolution
// =============================================================================

#[tokio::test]
async fn test_resolve_playlist() {
    let fixture = TestFixture::new().await;
    fixture
        .catalog
        .add_playlist("37i9dQZF1DXcBWIGoYBM5M", fixtures::playlist("Mix", 3));

    let response = fixture
        .post(
            "/api/v1/playlists/resolve",
            json!({ "url": "https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["name"], "Mix");
    assert_eq!(response.body["total"], 3);
    assert_eq!(response.body["songs"][0]["id"], 1);
    assert_eq!(
        response.body["songs"][0]["search_query"],
        "Song 1 Artist official audio"
    );
    assert_eq!(response.body["songs"][0]["filename"], "Song 1 - Artist.mp3");
}

#[tokio::test]
async fn test_resolve_playlist_errors() {
    let fixture = TestFixture::new().await;
    fixture.catalog.set_private("secret");

    let response = fixture
        .post("/api/v1/playlists/resolve", json!({ "url": "https://example.com/x" }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid Spotify playlist URL.");

    let response = fixture
        .post("/api/v1/playlists/resolve", json!({ "url": "spotify:playlist:secret" }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Playlist is private.");

    let response = fixture
        .post("/api/v1/playlists/resolve", json!({ "url": "spotify:playlist:missing" }))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture
        .post("/api/v1/playlists/resolve", json!({}))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resolve_playlist_without_catalog() {
    let fixture = TestFixture::with_config(TestConfig::without_catalog()).await;

    let response = fixture
        .post("/api/v1/playlists/resolve", json!({ "url": "spotify:playlist:abc" }))
        .await;
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    assert!(fixture.catalog.requests().is_empty());
}

// =============================================================================
// Batch Lifecycle
// =============================================================================

#[tokio::test]
async fn test_batch_with_failure_then_archive() {
    let fixture = TestFixture::new().await;
    fixture
        .fetcher
        .fail_query("Song 2 Artist official audio", "no match found");

    let batch_id = fixture.submit_songs(3).await;
    let progress = fixture.wait_for_batch(&batch_id).await;

    assert_eq!(progress["status"], "completed");
    assert_eq!(progress["total"], 3);
    assert_eq!(progress["completed"], 2);
    assert_eq!(
        progress["failures"],
        json!([{ "item": "Song 2 - Artist", "error": "no match found" }])
    );

    let response = fixture
        .get(&format!("/api/v1/batches/{}/archive", batch_id))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("application/zip"));
    assert!(response
        .header("content-disposition")
        .unwrap()
        .contains("playlist_songs.zip"));
    assert_eq!(
        zip_entry_names(&response.raw),
        vec!["Song 1 - Artist.mp3", "Song 3 - Artist.mp3"]
    );

    // The batch and its files are gone once the archive has been streamed
    let response = fixture.get(&format!("/api/v1/batches/{}", batch_id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let work_dir = fixture.temp_dir.path();
    assert!(!work_dir.join(format!("batch_{}", batch_id)).exists());
    assert!(!work_dir.join(format!("batch_{}.zip", batch_id)).exists());

    let response = fixture
        .get(&format!("/api/v1/batches/{}/archive", batch_id))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_with_overrides() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/batches",
            json!({
                "songs": [{
                    "title": "Song",
                    "artist": "Artist",
                    "search_query": "song artist live",
                    "filename": "custom:name.mp3"
                }]
            }),
        )
        .await;
    assert_status!(response, StatusCode::ACCEPTED);
    assert_eq!(response.body["total"], 1);

    let batch_id = response.body["batch_id"].as_str().unwrap().to_string();
    fixture.wait_for_batch(&batch_id).await;

    let calls = fixture.fetcher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].query, "song artist live");
    assert_eq!(calls[0].destination_name, "customname.mp3");
}

#[tokio::test]
async fn test_archive_before_completion_conflicts() {
    let fixture =
        TestFixture::with_config(TestConfig::with_fetch_delay(Duration::from_millis(300))).await;

    let batch_id = fixture.submit_songs(1).await;

    let response = fixture
        .get(&format!("/api/v1/batches/{}/archive", batch_id))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("not completed"));

    // Still collectable once it finishes
    fixture.wait_for_batch(&batch_id).await;
    let response = fixture
        .get(&format!("/api/v1/batches/{}/archive", batch_id))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_progress_invariant_under_polling() {
    let fixture =
        TestFixture::with_config(TestConfig::with_fetch_delay(Duration::from_millis(20))).await;
    fixture
        .fetcher
        .fail_query("Song 3 Artist official audio", "no match found");

    let batch_id = fixture.submit_songs(5).await;
    let path = format!("/api/v1/batches/{}", batch_id);

    loop {
        let response = fixture.get(&path).await;
        assert_status!(response, StatusCode::OK);

        let completed = response.body["completed"].as_u64().unwrap();
        let failed = response.body["failures"].as_array().unwrap().len() as u64;
        let total = response.body["total"].as_u64().unwrap();
        assert!(completed + failed <= total);

        if response.body["status"] == "completed" {
            assert_eq!(completed + failed, total);
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_unknown_batch_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/batches/doesnotexist").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "batch not found: doesnotexist");

    let response = fixture.get("/api/v1/batches/doesnotexist/archive").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_invalid_payloads() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/api/v1/batches", json!({ "songs": [] })).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No songs provided");

    let response = fixture
        .post("/api/v1/batches", json!({ "songs": [{ "title": "  " }] }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = fixture
        .post(
            "/api/v1/batches",
            json!({ "songs": [{ "title": "Song", "artist": "A" }, { "artist": "B" }] }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Item 2 has an empty title");

    let response = fixture.post_raw("/api/v1/batches", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert_eq!(fixture.orchestrator.status().running_batches, 0);
}

// =============================================================================
// Single Downloads
// =============================================================================

#[tokio::test]
async fn test_single_download() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/downloads/single",
            json!({
                "query": "My Song Me official audio",
                "filename": "My Song - Me.mp3",
                "title": "My Song",
                "artist": "Me"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("audio/mpeg"));
    assert_eq!(response.header("content-length"), Some("10"));
    assert!(response
        .header("content-disposition")
        .unwrap()
        .starts_with("attachment; filename=\"My Song - Me.mp3\""));
    assert_eq!(response.raw, b"mock audio");

    // Scratch directory is removed after streaming
    let leftovers: Vec<_> = std::fs::read_dir(fixture.temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("single_"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_single_download_missing_fields() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/downloads/single", json!({ "query": "something" }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Missing query or filename");
    assert!(fixture.fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_single_download_failure() {
    let fixture = TestFixture::new().await;
    fixture.fetcher.fail_query("nothing", "no match found");

    let response = fixture
        .post(
            "/api/v1/downloads/single",
            json!({ "query": "nothing", "filename": "x.mp3" }),
        )
        .await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "Download failed: no match found");
}
