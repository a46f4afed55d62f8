//! The user session activity record.

use crate::partition_key::{KeyField, PartitionKey, PartitionKeyError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Activity vocabulary for generated sessions.
pub const ACTIVITIES: [&str; 15] = [
    "login",
    "logout",
    "view_dashboard",
    "create_document",
    "edit_document",
    "delete_document",
    "share_document",
    "upload_file",
    "download_file",
    "search",
    "update_profile",
    "change_settings",
    "invite_user",
    "export_report",
    "api_call",
];

/// A single tenant/user/session activity record.
///
/// `tenant_id`, `user_id` and `session_id` form the record's hierarchical
/// partition key, in that order. `id` is a separate identifier, unique
/// within the partition, so that retried writes of the same record replace
/// it instead of adding a second copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub session_id: String,
    pub activity: String,
    pub timestamp: DateTime<Utc>,
}

impl UserSession {
    /// The record's full three segment partition key.
    pub fn partition_key(&self) -> Result<PartitionKey, PartitionKeyError> {
        PartitionKey::for_session(self)
    }

    /// Value of a key field on this record.
    pub fn key_value(&self, field: KeyField) -> &str {
        field.value_of(self)
    }
}
