use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scrape_core::{ErrorCategory, ScrapeError};
use scrape_engine::ExportError;
use serde_json::json;

/// Error answer of every route: a status code and a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        let status = match (&err, err.category()) {
            (ScrapeError::TimedOut, _) => StatusCode::GATEWAY_TIMEOUT,
            (ScrapeError::Cancelled, _) => StatusCode::CONFLICT,
            (_, ErrorCategory::InvalidInput) => StatusCode::BAD_REQUEST,
            (_, ErrorCategory::NothingToScrape) => StatusCode::NOT_FOUND,
            (_, ErrorCategory::Incomplete) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NoRecords => Self::not_found("No posts found to write CSV"),
            ExportError::Persist(err) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
