//! Client setup errors and HTTP status mapping.

use document_store::StoreError;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building a [`CosmosStore`](crate::CosmosStore).
#[derive(Error, Debug)]
pub enum CosmosError {
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid master key: {0}")]
    InvalidKey(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Map a non-success response to a store error.
pub(crate) fn status_to_error(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    resource: &str,
) -> StoreError {
    let message = error_message(body).unwrap_or_else(|| status.to_string());
    match status.as_u16() {
        400 => StoreError::BadRequest(message),
        401 | 403 => StoreError::Unauthorized(message),
        404 => StoreError::NotFound(resource.to_string()),
        409 => StoreError::Conflict(resource.to_string()),
        429 => StoreError::Throttled {
            retry_after: retry_after(headers),
        },
        408 | 410 | 449 => StoreError::Transient(format!("{status}: {message}")),
        s if s >= 500 => StoreError::Transient(format!("{status}: {message}")),
        _ => StoreError::Other(format!("{status}: {message}")),
    }
}

/// Map a transport failure. Connection and timeout failures are retryable.
pub(crate) fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        StoreError::Transient(err.to_string())
    } else {
        StoreError::Other(err.to_string())
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("x-ms-retry-after-ms")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
        .map(|ms| Duration::from_micros((ms * 1000.0) as u64))
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.lines().next().unwrap_or(m).to_string())
}
