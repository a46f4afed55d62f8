//! Query patterns and their selection from held key segments.

use crate::error::QueryError;
use document_store::{QueryScope, QuerySpec};
use hpk_core::{KeyField, PartitionKey, PartitionKeyBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key segments (and optionally a record id) known to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFilter {
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub id: Option<String>,
}

impl KeyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn get(&self, field: KeyField) -> Option<&str> {
        match field {
            KeyField::TenantId => self.tenant_id.as_deref(),
            KeyField::UserId => self.user_id.as_deref(),
            KeyField::SessionId => self.session_id.as_deref(),
        }
    }
}

/// One of the supported read paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPattern {
    /// Single item by id within a full key.
    PointRead { key: PartitionKey, id: String },
    /// Every record in one full-key partition.
    FullKey(PartitionKey),
    /// Every record under a tenant + user prefix.
    TenantAndUser(PartitionKey),
    /// Records matching one key field across all partitions.
    SingleField { field: KeyField, value: String },
}

impl QueryPattern {
    pub fn point_read(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let id = id.into();
        if id.is_empty() {
            return Err(QueryError::InvalidRequest("record id is empty".to_string()));
        }
        let segments: [String; 3] = [tenant_id.into(), user_id.into(), session_id.into()];
        let key = PartitionKey::build(segments)?;
        Ok(QueryPattern::PointRead { key, id })
    }

    pub fn full_key(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let segments: [String; 3] = [tenant_id.into(), user_id.into(), session_id.into()];
        let key = PartitionKey::build(segments)?;
        Ok(QueryPattern::FullKey(key))
    }

    pub fn tenant_and_user(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let segments: [String; 2] = [tenant_id.into(), user_id.into()];
        let key = PartitionKey::build(segments)?;
        Ok(QueryPattern::TenantAndUser(key))
    }

    /// Fan-out query on one key field, named as in the document.
    ///
    /// Only `tenantId`, `userId` and `sessionId` are accepted.
    pub fn single_field(field: &str, value: impl Into<String>) -> Result<Self, QueryError> {
        let field: KeyField = field.parse()?;
        let value = value.into();
        if value.is_empty() {
            return Err(hpk_core::PartitionKeyError::EmptySegment(field).into());
        }
        Ok(QueryPattern::SingleField { field, value })
    }

    /// Pick the cheapest pattern for the segments in `filter`.
    pub fn select(filter: &KeyFilter) -> Result<Self, QueryError> {
        let builder = KeyField::ALL
            .iter()
            .fold(PartitionKeyBuilder::new(), |builder, field| {
                builder.maybe_field(*field, filter.get(*field))
            });
        let present = builder.present_fields();

        if let Some(id) = &filter.id {
            if present.len() != KeyField::ALL.len() {
                return Err(QueryError::InvalidRequest(
                    "a point read needs tenantId, userId and sessionId".to_string(),
                ));
            }
            let key = builder.build()?;
            return Self::point_read_with_key(key, id);
        }

        match present.as_slice() {
            [] => Err(QueryError::InvalidRequest(
                "at least one of tenantId, userId or sessionId is required".to_string(),
            )),
            [field] => {
                let value = filter.get(*field).unwrap_or_default();
                Self::single_field(field.as_str(), value)
            }
            _ => {
                let key = builder.build()?;
                if key.is_full() {
                    Ok(QueryPattern::FullKey(key))
                } else {
                    Ok(QueryPattern::TenantAndUser(key))
                }
            }
        }
    }

    fn point_read_with_key(key: PartitionKey, id: &str) -> Result<Self, QueryError> {
        if id.is_empty() {
            return Err(QueryError::InvalidRequest("record id is empty".to_string()));
        }
        Ok(QueryPattern::PointRead {
            key,
            id: id.to_string(),
        })
    }

    /// Short name used in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            QueryPattern::PointRead { .. } => "point-read",
            QueryPattern::FullKey(_) => "full-key",
            QueryPattern::TenantAndUser(_) => "tenant-user",
            QueryPattern::SingleField { .. } => "single-field",
        }
    }

    /// Partitions the store may touch.
    pub fn scope(&self) -> QueryScope {
        match self {
            QueryPattern::PointRead { key, .. } | QueryPattern::FullKey(key) => {
                QueryScope::Partition(key.clone())
            }
            QueryPattern::TenantAndUser(key) => QueryScope::Prefix(key.clone()),
            QueryPattern::SingleField { .. } => QueryScope::CrossPartition,
        }
    }

    /// Filter query for the pattern; `None` for a point read.
    pub fn query(&self) -> Option<QuerySpec> {
        match self {
            QueryPattern::PointRead { .. } => None,
            QueryPattern::FullKey(key) | QueryPattern::TenantAndUser(key) => {
                Some(equality_query(key.fields()))
            }
            QueryPattern::SingleField { field, value } => {
                Some(equality_query([(*field, value.as_str())]))
            }
        }
    }
}

impl fmt::Display for QueryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPattern::PointRead { key, id } => write!(f, "point-read {id} in {key}"),
            QueryPattern::FullKey(key) | QueryPattern::TenantAndUser(key) => {
                write!(f, "{} {key}", self.name())
            }
            QueryPattern::SingleField { field, value } => {
                write!(f, "single-field {field} = {value}")
            }
        }
    }
}

/// `SELECT * FROM c WHERE c.<field> = @<field> AND ...`
fn equality_query<'a>(conditions: impl IntoIterator<Item = (KeyField, &'a str)>) -> QuerySpec {
    let mut clauses = Vec::new();
    let mut parameters = Vec::new();
    for (field, value) in conditions {
        clauses.push(format!("c.{0} = @{0}", field.as_str()));
        parameters.push((format!("@{}", field.as_str()), value.to_string()));
    }

    let query = format!("SELECT * FROM c WHERE {}", clauses.join(" AND "));
    parameters
        .into_iter()
        .fold(QuerySpec::new(query), |spec, (name, value)| spec.param(name, value))
}
