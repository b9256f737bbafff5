//! Metrics middleware for API routes.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION};

/// Path label for requests no route matched (static files, unknown paths).
pub const UNMATCHED_PATH: &str = "unmatched";

/// Records duration, count and in-flight requests per route.
///
/// Requests are labelled with the route template (`/api/v1/batches/{id}`),
/// never the raw path, so batch ids do not become label values.
/// For attachments the duration covers producing the response head, not
/// streaming the body.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());

    HTTP_REQUESTS_IN_FLIGHT.inc();
    let response = next.run(request).await;
    HTTP_REQUESTS_IN_FLIGHT.dec();

    let status = response.status().as_u16().to_string();
    let labels = [method.as_str(), path.as_str(), status.as_str()];

    HTTP_REQUEST_DURATION
        .with_label_values(&labels)
        .observe(start.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    fn app() -> Router {
        let nested = Router::new().route("/jobs/{id}/archive", get(dummy_handler));
        Router::new()
            .nest("/v9", nested)
            .layer(middleware::from_fn(metrics_middleware))
    }

    async fn send(app: Router, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_labels_use_route_template() {
        let labels = ["GET", "/v9/jobs/{id}/archive", "200"];
        let before = HTTP_REQUESTS_TOTAL.with_label_values(&labels).get();

        for id in ["0123456789abcdef0123456789abcdef", "foo", "12"] {
            let uri = format!("/v9/jobs/{}/archive", id);
            assert_eq!(send(app(), &uri).await, StatusCode::OK);
        }

        assert_eq!(
            HTTP_REQUESTS_TOTAL.with_label_values(&labels).get(),
            before + 3
        );
    }

    #[tokio::test]
    async fn test_unknown_paths_share_one_label() {
        let labels = ["GET", UNMATCHED_PATH, "404"];
        let before = HTTP_REQUESTS_TOTAL.with_label_values(&labels).get();

        assert_eq!(send(app(), "/nowhere/a").await, StatusCode::NOT_FOUND);
        assert_eq!(send(app(), "/nowhere/b").await, StatusCode::NOT_FOUND);

        assert_eq!(
            HTTP_REQUESTS_TOTAL.with_label_values(&labels).get(),
            before + 2
        );
    }
}
