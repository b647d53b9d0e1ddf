//! Case-insensitive query string access
//!
//! Clients send the same parameter as `CopyTimestamps`, `copyTimestamps`
//! or `copytimestamps`; lookups here ignore ASCII case.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::Uri;

use super::handlers::HttpError;
use crate::error::{Result, SubtitleError};

/// Decoded query parameters in request order.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn from_uri(uri: &Uri) -> Result<Self> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
            .map_err(|e| SubtitleError::validation(format!("invalid query string: {}", e)))?;
        Ok(Self { pairs })
    }

    /// First value for `key`, ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key` that is present and non-empty.
    fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.get_non_empty(key)
            .map(|v| match v.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(SubtitleError::validation(format!(
                    "{} must be a boolean, got {:?}",
                    key, v
                ))),
            })
            .transpose()
    }

    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.get_non_empty(key)
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    SubtitleError::validation(format!("{} must be an integer, got {:?}", key, v))
                })
            })
            .transpose()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        QueryParams::from_uri(&parts.uri).map_err(HttpError::from)
    }
}
