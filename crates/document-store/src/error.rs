//! Error types for store operations.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by a [`DocumentStore`](crate::DocumentStore).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Resource already exists.
    #[error("Resource already exists: {0}")]
    Conflict(String),

    /// Resource (database, container or item) not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The store asked the client to slow down.
    #[error("Request throttled (retry after {retry_after:?})")]
    Throttled { retry_after: Option<Duration> },

    /// Temporary failure; the same request may succeed later.
    #[error("Transient store error: {0}")]
    Transient(String),

    /// The caller's deadline expired before the store answered.
    #[error("Store request timed out after {0:?}")]
    Timeout(Duration),

    /// The request was malformed or inconsistent with the container.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Credentials were rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An existing container uses a different partition key layout.
    #[error(
        "Container '{container}' already exists with partition key paths {found:?}, expected {expected:?}"
    )]
    SchemaMismatch {
        container: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Any other store failure.
    #[error("Store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Throttled { .. } | StoreError::Transient(_) | StoreError::Timeout(_)
        )
    }

    /// Server supplied delay before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            StoreError::Throttled { retry_after } => *retry_after,
            _ => None,
        }
    }
}
