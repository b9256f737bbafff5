//! JSON error bodies shared by the API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tunebatch_core::{BatchError, CatalogError};

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A status code plus an `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        let status = match &err {
            BatchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BatchError::NotFound(_) => StatusCode::NOT_FOUND,
            BatchError::NotReady(_) | BatchError::ArchiveInProgress(_) => StatusCode::CONFLICT,
            BatchError::ItemFailure(_) => StatusCode::BAD_GATEWAY,
            BatchError::Archive(_) | BatchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let status = match &err {
            CatalogError::InvalidUrl | CatalogError::Private => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Http(_)
            | CatalogError::Api { .. }
            | CatalogError::Parse(_)
            | CatalogError::Auth(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}
