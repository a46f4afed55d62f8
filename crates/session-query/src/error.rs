//! Error types for query dispatch.

use document_store::StoreError;
use hpk_core::PartitionKeyError;
use thiserror::Error;

/// Errors that can occur while selecting or running a query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The request cannot be expressed with the held key segments.
    #[error("Invalid query request: {0}")]
    InvalidRequest(String),

    /// The key segments are not a usable partition key.
    #[error("Invalid query request: {0}")]
    InvalidKey(#[from] PartitionKeyError),

    /// A page could not be fetched; the result stream ends here.
    #[error("Query failed: {0}")]
    Store(#[from] StoreError),

    /// A point read failed. Point reads have no partial results.
    #[error("Point read of '{id}' failed: {source}")]
    PointRead {
        id: String,
        #[source]
        source: StoreError,
    },

    /// One document could not be decoded into a session.
    #[error("Failed to decode document: {0}")]
    Decode(String),
}

impl QueryError {
    /// Whether the request was rejected without contacting the store.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, QueryError::InvalidRequest(_) | QueryError::InvalidKey(_))
    }
}
