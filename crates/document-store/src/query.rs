//! Query request and response types.

use hpk_core::PartitionKey;
use serde::{Deserialize, Serialize};

/// Which partitions a query is allowed to touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryScope {
    /// Exactly one logical partition (full key).
    Partition(PartitionKey),
    /// Every logical partition under a key prefix.
    Prefix(PartitionKey),
    /// All partitions (fan-out).
    CrossPartition,
}

impl QueryScope {
    /// `Partition` for a full key, `Prefix` otherwise.
    pub fn for_key(key: PartitionKey) -> Self {
        if key.is_full() {
            QueryScope::Partition(key)
        } else {
            QueryScope::Prefix(key)
        }
    }

    /// Whether an item addressed by `segments` is inside this scope.
    pub fn includes(&self, segments: &[String]) -> bool {
        match self {
            QueryScope::Partition(key) => key.segments() == segments,
            QueryScope::Prefix(key) => key.covers(segments),
            QueryScope::CrossPartition => true,
        }
    }

    /// The key this scope is bound to, if any.
    pub fn key(&self) -> Option<&PartitionKey> {
        match self {
            QueryScope::Partition(key) | QueryScope::Prefix(key) => Some(key),
            QueryScope::CrossPartition => None,
        }
    }
}

/// A named query parameter, e.g. `@tenantId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    pub name: String,
    pub value: serde_json::Value,
}

/// Query text plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub query: String,
    pub parameters: Vec<QueryParam>,
}

impl QuerySpec {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
        }
    }

    /// Bind a parameter. Names include the leading `@`.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.push(QueryParam {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn get_param(&self, name: &str) -> Option<&serde_json::Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    /// Raw JSON documents
    pub documents: Vec<Vec<u8>>,
    /// Resource cost reported for this page
    pub request_charge: f64,
    /// Token for the next page; `None` on the last page
    pub continuation: Option<String>,
}

/// Result of a point read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResponse {
    pub document: Vec<u8>,
    pub request_charge: f64,
}

/// Result of a write.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WriteResponse {
    pub request_charge: f64,
}
