//! Core types for the hierarchical partition key session store.
//!
//! This crate provides the foundational types shared by the generator,
//! loader and query crates:
//!
//! - [`TenantProfile`] / [`TenantCatalog`] - the tenant cardinality model
//! - [`UserSession`] - the activity record written to the store
//! - [`KeyField`] - the closed set of partition key fields
//! - [`PartitionKey`] / [`PartitionKeyBuilder`] - ordered 1-3 segment keys
//!
//! # Architecture
//!
//! ```text
//! hpk-core (this crate)
//!    │
//!    ├─── session-generator  (TenantCatalog -> UserSession)
//!    ├─── document-store     (PartitionKey-addressed reads and writes)
//!    ├─── session-loader     (UserSession -> store)
//!    └─── session-query      (KeyField / PartitionKey -> query patterns)
//! ```
//!
//! # Key hierarchy
//!
//! Records are addressed by a three level key, tenant first:
//!
//! ```text
//! /tenantId  ->  /userId  ->  /sessionId
//! ```
//!
//! A key may hold one, two or three segments, but always as a contiguous
//! prefix of that hierarchy.
//!
//! # Example
//!
//! ```rust
//! use hpk_core::PartitionKey;
//!
//! let tenant = PartitionKey::build(["MidMarket-Inc"]).unwrap();
//! let full = PartitionKey::build(["MidMarket-Inc", "user-192", "session-5af6ab47"]).unwrap();
//!
//! assert!(tenant.is_prefix_of(&full));
//! assert_eq!(full.to_string(), "MidMarket-Inc/user-192/session-5af6ab47");
//! ```

pub mod partition_key;
pub mod session;
pub mod tenant;

// Re-exports for convenience
pub use partition_key::{
    KeyField, PartitionKey, PartitionKeyBuilder, PartitionKeyError, MAX_DEPTH, SEGMENT_SEPARATOR,
};
pub use session::{UserSession, ACTIVITIES};
pub use tenant::{CatalogError, TenantCatalog, TenantProfile};
