//! Hierarchical partition keys.
//!
//! A [`PartitionKey`] is an ordered list of one to three segments, one per
//! hierarchy level (tenant, user, session). Full prefixes are cheap for the
//! store to address; a key with a gap (tenant + session without user) is not
//! addressable at all, so every consumer must only ever build contiguous
//! prefixes.

use crate::session::UserSession;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of segments in a partition key.
pub const MAX_DEPTH: usize = 3;

/// Separator used by the string form of a key. Segments may not contain it.
pub const SEGMENT_SEPARATOR: char = '/';

// ============================================================================
// Error Types
// ============================================================================

/// Error type for partition key construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionKeyError {
    /// Wrong number of segments
    #[error("Partition key must have between 1 and 3 segments, got {0}")]
    InvalidArity(usize),

    /// A segment was supplied but is empty
    #[error("Partition key segment for '{0}' is empty")]
    EmptySegment(KeyField),

    /// Field name outside of the key hierarchy
    #[error("Unsupported partition key field: '{0}' (expected tenantId, userId or sessionId)")]
    UnsupportedField(String),

    /// A segment contains the separator of the string form
    #[error("Partition key segment for '{field}' contains '{separator}': '{segment}'", separator = SEGMENT_SEPARATOR)]
    SeparatorInSegment { field: KeyField, segment: String },

    /// A lower level was supplied without the level above it
    #[error("Non-contiguous partition key: '{present}' supplied without '{missing}'")]
    NonContiguous { missing: KeyField, present: KeyField },
}

// ============================================================================
// Key Fields
// ============================================================================

/// One level of the key hierarchy.
///
/// Ordered from the top of the hierarchy: `TenantId < UserId < SessionId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyField {
    #[serde(rename = "tenantId")]
    TenantId,
    #[serde(rename = "userId")]
    UserId,
    #[serde(rename = "sessionId")]
    SessionId,
}

impl KeyField {
    /// All key fields in hierarchy order.
    pub const ALL: [KeyField; MAX_DEPTH] = [KeyField::TenantId, KeyField::UserId, KeyField::SessionId];

    /// Document field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyField::TenantId => "tenantId",
            KeyField::UserId => "userId",
            KeyField::SessionId => "sessionId",
        }
    }

    /// Container partition key path for this level.
    pub fn path(&self) -> &'static str {
        match self {
            KeyField::TenantId => "/tenantId",
            KeyField::UserId => "/userId",
            KeyField::SessionId => "/sessionId",
        }
    }

    /// Zero-based hierarchy level.
    pub fn level(&self) -> usize {
        match self {
            KeyField::TenantId => 0,
            KeyField::UserId => 1,
            KeyField::SessionId => 2,
        }
    }

    /// Field for a zero-based hierarchy level.
    pub fn from_level(level: usize) -> Option<KeyField> {
        Self::ALL.get(level).copied()
    }

    /// The container key paths for the full hierarchy, in order.
    pub fn hierarchy_paths() -> Vec<String> {
        Self::ALL.iter().map(|f| f.path().to_string()).collect()
    }

    /// Value of this field on a session record.
    pub fn value_of<'a>(&self, session: &'a UserSession) -> &'a str {
        match self {
            KeyField::TenantId => &session.tenant_id,
            KeyField::UserId => &session.user_id,
            KeyField::SessionId => &session.session_id,
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyField {
    type Err = PartitionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenantId" => Ok(KeyField::TenantId),
            "userId" => Ok(KeyField::UserId),
            "sessionId" => Ok(KeyField::SessionId),
            other => Err(PartitionKeyError::UnsupportedField(other.to_string())),
        }
    }
}

// ============================================================================
// Partition Key
// ============================================================================

/// An ordered hierarchical partition key of 1 to 3 segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PartitionKey {
    segments: Vec<String>,
}

impl PartitionKey {
    /// Build a key from segments supplied top of hierarchy first.
    ///
    /// Only arity, non-empty segments and the absence of
    /// [`SEGMENT_SEPARATOR`] are checked. Positional segments
    /// are contiguous by construction; use [`PartitionKeyBuilder`] when the
    /// caller holds an arbitrary subset of fields.
    pub fn build<I, S>(segments: I) -> Result<Self, PartitionKeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();

        if segments.is_empty() || segments.len() > MAX_DEPTH {
            return Err(PartitionKeyError::InvalidArity(segments.len()));
        }

        for (level, segment) in segments.iter().enumerate() {
            // level < MAX_DEPTH was checked above
            let field = KeyField::from_level(level).unwrap_or(KeyField::SessionId);
            if segment.is_empty() {
                return Err(PartitionKeyError::EmptySegment(field));
            }
            if segment.contains(SEGMENT_SEPARATOR) {
                return Err(PartitionKeyError::SeparatorInSegment {
                    field,
                    segment: segment.clone(),
                });
            }
        }

        Ok(Self { segments })
    }

    /// Full three segment key addressing a session record.
    pub fn for_session(session: &UserSession) -> Result<Self, PartitionKeyError> {
        Self::build(KeyField::ALL.iter().map(|f| f.value_of(session)))
    }

    /// Key segments, top of hierarchy first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether every hierarchy level is present.
    pub fn is_full(&self) -> bool {
        self.segments.len() == MAX_DEPTH
    }

    /// Deepest field present in this key.
    pub fn deepest_field(&self) -> KeyField {
        KeyField::from_level(self.segments.len() - 1).unwrap_or(KeyField::SessionId)
    }

    /// Segment for a field, if that level is present.
    pub fn get(&self, field: KeyField) -> Option<&str> {
        self.segments.get(field.level()).map(String::as_str)
    }

    /// Pairs of (field, segment) in hierarchy order.
    pub fn fields(&self) -> impl Iterator<Item = (KeyField, &str)> {
        KeyField::ALL
            .iter()
            .copied()
            .zip(self.segments.iter().map(String::as_str))
    }

    /// Whether this key is a (non-strict) segment-wise prefix of `other`.
    pub fn is_prefix_of(&self, other: &PartitionKey) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }

    /// Whether a full key addressed by the given segments falls under this key.
    pub fn covers(&self, segments: &[String]) -> bool {
        self.segments.len() <= segments.len()
            && self.segments.iter().zip(segments.iter()).all(|(a, b)| a == b)
    }

    /// Whether a session record falls under this key.
    pub fn matches(&self, session: &UserSession) -> bool {
        self.fields().all(|(field, value)| field.value_of(session) == value)
    }

    /// JSON array form, e.g. `["MidMarket-Inc","user-192"]`.
    pub fn to_json_array(&self) -> String {
        serde_json::Value::from(self.segments.clone()).to_string()
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEGMENT_SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for PartitionKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let segments = Vec::<String>::deserialize(deserializer)?;
        PartitionKey::build(segments).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`PartitionKey`] from whichever fields the caller holds.
///
/// Unlike [`PartitionKey::build`], fields may be set in any order and any
/// may be missing; `build` rejects gaps in the hierarchy.
///
/// ```rust
/// use hpk_core::{KeyField, PartitionKeyBuilder, PartitionKeyError};
///
/// let key = PartitionKeyBuilder::new()
///     .tenant("LocalShops-SME")
///     .user("user-42")
///     .build()
///     .unwrap();
/// assert_eq!(key.depth(), 2);
///
/// let gap = PartitionKeyBuilder::new()
///     .tenant("LocalShops-SME")
///     .session("session-0361ef4c")
///     .build();
/// assert_eq!(
///     gap,
///     Err(PartitionKeyError::NonContiguous {
///         missing: KeyField::UserId,
///         present: KeyField::SessionId,
///     })
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct PartitionKeyBuilder {
    values: [Option<String>; MAX_DEPTH],
}

impl PartitionKeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tenant(self, tenant_id: impl Into<String>) -> Self {
        self.field(KeyField::TenantId, tenant_id)
    }

    pub fn user(self, user_id: impl Into<String>) -> Self {
        self.field(KeyField::UserId, user_id)
    }

    pub fn session(self, session_id: impl Into<String>) -> Self {
        self.field(KeyField::SessionId, session_id)
    }

    /// Set a field by its hierarchy level.
    pub fn field(mut self, field: KeyField, value: impl Into<String>) -> Self {
        self.values[field.level()] = Some(value.into());
        self
    }

    /// Set a field only when a value is present.
    pub fn maybe_field(self, field: KeyField, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.field(field, value),
            None => self,
        }
    }

    /// Fields currently set, in hierarchy order.
    pub fn present_fields(&self) -> Vec<KeyField> {
        KeyField::ALL
            .iter()
            .copied()
            .filter(|f| self.values[f.level()].is_some())
            .collect()
    }

    /// Build the key, rejecting non-contiguous combinations.
    pub fn build(self) -> Result<PartitionKey, PartitionKeyError> {
        let mut missing: Option<KeyField> = None;
        let mut segments = Vec::with_capacity(MAX_DEPTH);

        for (field, value) in KeyField::ALL.iter().copied().zip(self.values) {
            match (value, missing) {
                (Some(_), Some(missing)) => {
                    return Err(PartitionKeyError::NonContiguous {
                        missing,
                        present: field,
                    });
                }
                (Some(value), None) => segments.push(value),
                (None, None) => missing = Some(field),
                (None, Some(_)) => {}
            }
        }

        PartitionKey::build(segments)
    }
}
