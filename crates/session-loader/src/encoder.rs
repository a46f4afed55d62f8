//! Session to document encoding.

use hpk_core::UserSession;
use thiserror::Error;

/// A session could not be turned into a document.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to encode session '{id}': {reason}")]
pub struct EncodeError {
    pub id: String,
    pub reason: String,
}

impl EncodeError {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Turns a session into the bytes written to the store.
pub trait SessionEncoder: Send + Sync {
    fn encode(&self, session: &UserSession) -> Result<Vec<u8>, EncodeError>;
}

/// camelCase JSON, the layout the query side decodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl SessionEncoder for JsonEncoder {
    fn encode(&self, session: &UserSession) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(session).map_err(|e| EncodeError::new(&session.id, e.to_string()))
    }
}
