//! HTTP request handlers
//!
//! Error mapping and the service endpoints. Subtitle endpoints live in
//! `subtitles.rs`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::SubtitleError;

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Unavailable(String),
    InternalError(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            HttpError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            HttpError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, body).into_response()
    }
}

impl From<SubtitleError> for HttpError {
    fn from(err: SubtitleError) -> Self {
        if !err.is_client_error() {
            tracing::error!("Request failed: {}", err);
        }

        match err {
            SubtitleError::NotFound(what) => HttpError::NotFound(format!("Not found: {}", what)),
            SubtitleError::Validation(msg) => HttpError::BadRequest(msg),
            SubtitleError::Upstream(_) => HttpError::BadGateway(err.to_string()),
            SubtitleError::Cancelled => HttpError::Unavailable(err.to_string()),
            _ => HttpError::InternalError(err.to_string()),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
