//! Container provisioning types.

use crate::error::StoreError;
use hpk_core::{KeyField, MAX_DEPTH};

/// Default provisioned throughput for new containers.
pub const DEFAULT_THROUGHPUT: u32 = 400;

/// What `ensure_container` should create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub database: String,
    pub name: String,
    /// Partition key paths, top of hierarchy first (1 to 3)
    pub key_paths: Vec<String>,
    pub throughput: u32,
}

impl ContainerSpec {
    /// Container keyed by the full tenant/user/session hierarchy.
    pub fn hierarchical(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
            key_paths: KeyField::hierarchy_paths(),
            throughput: DEFAULT_THROUGHPUT,
        }
    }

    pub fn with_key_paths(mut self, key_paths: Vec<String>) -> Self {
        self.key_paths = key_paths;
        self
    }

    pub fn with_throughput(mut self, throughput: u32) -> Self {
        self.throughput = throughput;
        self
    }

    /// Check names and key path arity before contacting the store.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.database.is_empty() || self.name.is_empty() {
            return Err(StoreError::BadRequest(
                "database and container names must not be empty".to_string(),
            ));
        }
        if self.key_paths.is_empty() || self.key_paths.len() > MAX_DEPTH {
            return Err(StoreError::BadRequest(format!(
                "container '{}' needs 1 to {MAX_DEPTH} partition key paths, got {}",
                self.name,
                self.key_paths.len()
            )));
        }
        if let Some(path) = self.key_paths.iter().find(|p| !p.starts_with('/') || p.len() < 2) {
            return Err(StoreError::BadRequest(format!(
                "invalid partition key path '{path}'"
            )));
        }
        Ok(())
    }

    /// Fail when an existing container's key paths differ from this spec.
    pub fn check_compatible(&self, existing_paths: &[String]) -> Result<(), StoreError> {
        if existing_paths == self.key_paths.as_slice() {
            Ok(())
        } else {
            Err(StoreError::SchemaMismatch {
                container: self.name.clone(),
                expected: self.key_paths.clone(),
                found: existing_paths.to_vec(),
            })
        }
    }

    pub fn handle(&self) -> ContainerHandle {
        ContainerHandle {
            database: self.database.clone(),
            container: self.name.clone(),
            key_paths: self.key_paths.clone(),
        }
    }
}

/// Outcome of provisioning. An existing container is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

/// Reference to a provisioned container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub database: String,
    pub container: String,
    pub key_paths: Vec<String>,
}

impl ContainerHandle {
    /// Number of partition key levels in this container.
    pub fn key_depth(&self) -> usize {
        self.key_paths.len()
    }

    /// Document field name for each key level (`/tenantId` -> `tenantId`).
    pub fn key_fields(&self) -> Vec<&str> {
        self.key_paths
            .iter()
            .map(|p| p.trim_start_matches('/'))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchical_spec() {
        let spec = ContainerSpec::hierarchical("db", "sessions");
        assert_eq!(spec.key_paths, vec!["/tenantId", "/userId", "/sessionId"]);
        assert_eq!(spec.throughput, DEFAULT_THROUGHPUT);
        assert!(spec.validate().is_ok());
        assert_eq!(spec.handle().key_fields(), vec!["tenantId", "userId", "sessionId"]);
    }

    #[test]
    fn test_validate_rejects_bad_specs() {
        let spec = ContainerSpec::hierarchical("db", "");
        assert!(matches!(spec.validate(), Err(StoreError::BadRequest(_))));

        let spec = ContainerSpec::hierarchical("db", "c").with_key_paths(vec![]);
        assert!(matches!(spec.validate(), Err(StoreError::BadRequest(_))));

        let spec = ContainerSpec::hierarchical("db", "c").with_key_paths(vec![
            "/a".into(),
            "/b".into(),
            "/c".into(),
            "/d".into(),
        ]);
        assert!(matches!(spec.validate(), Err(StoreError::BadRequest(_))));

        let spec = ContainerSpec::hierarchical("db", "c").with_key_paths(vec!["tenantId".into()]);
        assert!(matches!(spec.validate(), Err(StoreError::BadRequest(_))));
    }

    #[test]
    fn test_check_compatible() {
        let spec = ContainerSpec::hierarchical("db", "sessions");
        assert!(spec.check_compatible(&KeyField::hierarchy_paths()).is_ok());

        let err = spec
            .check_compatible(&["/tenantId".to_string()])
            .unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch { .. }));
    }
}
