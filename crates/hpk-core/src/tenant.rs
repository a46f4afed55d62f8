//! Tenant profiles and the catalog that drives synthetic data.
//!
//! The built-in catalog spans four orders of magnitude of user count so that
//! generated data shows the cardinality skew of a real multi-tenant system.
//! A catalog can also be loaded from YAML:
//!
//! ```yaml
//! tenants:
//!   - name: Enterprise-Corp
//!     user_count_min: 1000
//!     user_count_max: 10000
//!     sessions_per_user: 100
//! ```

use crate::partition_key::SEGMENT_SEPARATOR;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Error reading catalog file
    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Catalog has no tenants
    #[error("Tenant catalog is empty")]
    Empty,

    /// Tenant without a name
    #[error("Tenant at position {0} has an empty name")]
    EmptyName(usize),

    /// Tenant name cannot be used as a partition key segment
    #[error("Tenant name '{0}' must not contain '/'")]
    InvalidName(String),

    /// Two tenants share a name
    #[error("Duplicate tenant: {0}")]
    DuplicateTenant(String),

    /// User count range is empty or starts at zero
    #[error("Tenant '{name}' has invalid user count range {min}..={max}")]
    InvalidUserRange { name: String, min: u32, max: u32 },

    /// Zero sessions per user
    #[error("Tenant '{0}' must have at least one session per user")]
    NoSessions(String),
}

// ============================================================================
// Tenant Profile
// ============================================================================

/// Cardinality profile of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantProfile {
    /// Tenant name, used as the first partition key segment
    pub name: String,
    /// Smallest user number generated for this tenant
    pub user_count_min: u32,
    /// Largest user number generated for this tenant (inclusive)
    pub user_count_max: u32,
    /// Sessions generated per user when producing a user's full history
    pub sessions_per_user: u32,
}

impl TenantProfile {
    pub fn new(
        name: impl Into<String>,
        user_count_min: u32,
        user_count_max: u32,
        sessions_per_user: u32,
    ) -> Self {
        Self {
            name: name.into(),
            user_count_min,
            user_count_max,
            sessions_per_user,
        }
    }

    /// Whether a user number is inside this tenant's range.
    pub fn contains_user(&self, user_number: u32) -> bool {
        (self.user_count_min..=self.user_count_max).contains(&user_number)
    }

    fn validate(&self, position: usize) -> Result<(), CatalogError> {
        if self.name.is_empty() {
            return Err(CatalogError::EmptyName(position));
        }
        if self.name.contains(SEGMENT_SEPARATOR) {
            return Err(CatalogError::InvalidName(self.name.clone()));
        }
        if self.user_count_min == 0 || self.user_count_min > self.user_count_max {
            return Err(CatalogError::InvalidUserRange {
                name: self.name.clone(),
                min: self.user_count_min,
                max: self.user_count_max,
            });
        }
        if self.sessions_per_user == 0 {
            return Err(CatalogError::NoSessions(self.name.clone()));
        }
        Ok(())
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A validated, non-empty set of tenant profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantCatalog {
    tenants: Vec<TenantProfile>,
}

#[derive(Deserialize)]
struct CatalogFile {
    tenants: Vec<TenantProfile>,
}

impl TenantCatalog {
    /// Build a catalog, validating every profile.
    pub fn new(tenants: Vec<TenantProfile>) -> Result<Self, CatalogError> {
        if tenants.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for (position, tenant) in tenants.iter().enumerate() {
            tenant.validate(position)?;
            if !seen.insert(tenant.name.as_str()) {
                return Err(CatalogError::DuplicateTenant(tenant.name.clone()));
            }
        }

        Ok(Self { tenants })
    }

    /// The built-in catalog: from a handful of users up to ten thousand.
    pub fn builtin() -> Self {
        Self {
            tenants: vec![
                TenantProfile::new("Enterprise-Corp", 1000, 10000, 100),
                TenantProfile::new("MidMarket-Inc", 100, 1000, 50),
                TenantProfile::new("SmallBiz-LLC", 10, 100, 20),
                TenantProfile::new("Startup-Labs", 10, 200, 10),
                TenantProfile::new("LocalShops-SME", 10, 50, 5),
            ],
        }
    }

    /// Load catalog from YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse catalog from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.tenants)
    }

    /// Pick one tenant uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &TenantProfile {
        // non-empty by construction
        &self.tenants[rng.gen_range(0..self.tenants.len())]
    }

    /// Get a tenant by name.
    pub fn get(&self, name: &str) -> Option<&TenantProfile> {
        self.tenants.iter().find(|t| t.name == name)
    }

    /// Tenant names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.tenants.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TenantProfile> {
        self.tenants.iter()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

impl Default for TenantCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
