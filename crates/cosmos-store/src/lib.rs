//! Azure Cosmos DB backend for [`document_store::DocumentStore`].
//!
//! Talks to the REST API directly with master key authentication. Containers
//! are created with `MultiHash` partition keys so a tenant, a tenant's user,
//! or a single session can be addressed by key prefix.
//!
//! # Example
//!
//! ```ignore
//! let config = CosmosConfig::new("https://localhost:8081/", key).with_accept_invalid_certs(true);
//! let store = CosmosStore::new(&config)?;
//! let (handle, _) = store.ensure_container(&ContainerSpec::hierarchical("db", "sessions")).await?;
//! ```

pub mod auth;
mod client;
mod config;
mod error;

pub use client::{CosmosStore, API_VERSION};
pub use config::{CosmosConfig, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT};
pub use error::CosmosError;
