//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock fetcher and playlist catalog injected, enabling end-to-end
//! testing without yt-dlp or network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tunebatch_core::{
    testing::{MockFetcher, MockPlaylistCatalog},
    BatchOrchestrator, Config, OrchestratorConfig, PlaylistCatalog, ServerConfig, StorageConfig,
};

/// Re-export fixtures for test convenience
pub use tunebatch_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - Song fetching (MockFetcher)
/// - Playlist resolution (MockPlaylistCatalog)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/batches", json!({
///         "songs": [{ "title": "Song", "artist": "Artist" }]
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - configure failures and delays
    pub fetcher: Arc<MockFetcher>,
    /// Mock playlist catalog - register playlists
    pub catalog: Arc<MockPlaylistCatalog>,
    /// Orchestrator behind the router
    pub orchestrator: Arc<BatchOrchestrator>,
    /// Work directory for batch output and archives
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when empty or not JSON
    pub body: Value,
    /// Raw body bytes
    pub raw: Vec<u8>,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        // Create mocks
        let fetcher = Arc::new(MockFetcher::new().with_delay(test_config.fetch_delay));
        let catalog = Arc::new(MockPlaylistCatalog::new());

        // Create config
        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                static_dir: None,
            },
            storage: StorageConfig {
                work_dir: temp_dir.path().to_path_buf(),
                ..Default::default()
            },
            orchestrator: OrchestratorConfig {
                max_concurrent_fetches: test_config.max_concurrent_fetches,
                ..Default::default()
            },
            ..Default::default()
        };

        let orchestrator = Arc::new(BatchOrchestrator::new(
            config.orchestrator.clone(),
            config.storage.clone(),
            Arc::clone(&fetcher) as Arc<dyn tunebatch_core::ItemFetcher>,
        ));

        let playlist_catalog = if test_config.enable_catalog {
            Some(Arc::clone(&catalog) as Arc<dyn PlaylistCatalog>)
        } else {
            None
        };

        // Create app state with mocks
        let state = Arc::new(tunebatch_server::state::AppState::new(
            config,
            Arc::clone(&orchestrator),
            playlist_catalog,
        ));

        // Create router
        let router = tunebatch_server::api::create_router(state);

        Self {
            router,
            fetcher,
            catalog,
            orchestrator,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Submit `n` fixture songs and return the batch id.
    pub async fn submit_songs(&self, n: usize) -> String {
        let songs: Vec<Value> = (1..=n)
            .map(|i| serde_json::json!({ "title": format!("Song {}", i), "artist": "Artist" }))
            .collect();

        let response = self
            .post("/api/v1/batches", serde_json::json!({ "songs": songs }))
            .await;
        assert_eq!(response.status, StatusCode::ACCEPTED, "{:?}", response.body);

        response.body["batch_id"]
            .as_str()
            .expect("batch_id missing")
            .to_string()
    }

    /// Poll a batch until it leaves `running`, returning the final progress.
    pub async fn wait_for_batch(&self, batch_id: &str) -> Value {
        let path = format!("/api/v1/batches/{}", batch_id);
        for _ in 0..200 {
            let response = self.get(&path).await;
            assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
            if response.body["status"] != "running" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("batch {} did not finish in time", batch_id);
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            raw: body_bytes.to_vec(),
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Register the mock playlist catalog
    pub enable_catalog: bool,
    /// Simulated duration of each fetch
    pub fetch_delay: Duration,
    pub max_concurrent_fetches: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enable_catalog: true,
            fetch_delay: Duration::ZERO,
            max_concurrent_fetches: 4,
        }
    }
}

impl TestConfig {
    /// Create config without a playlist catalog.
    pub fn without_catalog() -> Self {
        Self {
            enable_catalog: false,
            ..Default::default()
        }
    }

    /// Create config with slow fetches, for observing running batches.
    pub fn with_fetch_delay(delay: Duration) -> Self {
        Self {
            fetch_delay: delay,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
