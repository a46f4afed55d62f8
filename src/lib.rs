//! hpk-sessions library
//!
//! Multi-tenant session activity stored under a hierarchical partition key
//! (tenant, then user, then session). The binary generates synthetic
//! sessions, loads them into an Azure Cosmos DB container and reads them back
//! with the cheapest query pattern the caller's key segments allow.
//!
//! # CLI Usage
//!
//! ```bash
//! # Load 1000 sessions (endpoint and key from COSMOS_DB_ENDPOINT / COSMOS_DB_KEY)
//! hpk-sessions load --row-count 1000 --database sessions-db --container sessions
//!
//! # Read back by whatever part of the key is known
//! hpk-sessions query full --tenant-id MidMarket-Inc --user-id user-192 --session-id session-5af6ab47
//! hpk-sessions query field --field tenantId --value Enterprise-Corp
//!
//! # Everything against an in-memory store
//! hpk-sessions demo --row-count 200
//! ```

use anyhow::Context;
use clap::Args;
use cosmos_store::{CosmosConfig, CosmosStore};
use document_store::{ContainerSpec, RetryPolicy, DEFAULT_THROUGHPUT};
use hpk_core::TenantCatalog;
use session_generator::SessionGenerator;
use std::path::PathBuf;
use std::time::Duration;

pub mod commands;

/// Cosmos DB account and container options.
#[derive(Args, Clone, Debug)]
pub struct CosmosOpts {
    /// Cosmos DB account endpoint
    #[arg(long, env = "COSMOS_DB_ENDPOINT")]
    pub endpoint: String,

    /// Cosmos DB master key (base64)
    #[arg(long, env = "COSMOS_DB_KEY", hide_env_values = true)]
    pub key: String,

    /// Database name
    #[arg(long, env = "COSMOS_DB_DATABASE_NAME")]
    pub database: String,

    /// Container name
    #[arg(long, env = "COSMOS_DB_CONTAINER_NAME")]
    pub container: String,

    /// Provisioned throughput (RU/s) for a newly created container
    #[arg(long, default_value_t = DEFAULT_THROUGHPUT)]
    pub throughput: u32,

    /// Accept self-signed certificates (local emulator)
    #[arg(long)]
    pub accept_invalid_certs: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    pub request_timeout_secs: u64,

    /// Maximum items per query page
    #[arg(long, default_value = "100")]
    pub page_size: u32,

    /// Retries for throttled or transient failures
    #[arg(long, default_value = "5")]
    pub max_retries: u32,
}

impl CosmosOpts {
    pub fn config(&self) -> CosmosConfig {
        CosmosConfig::new(&self.endpoint, &self.key)
            .with_accept_invalid_certs(self.accept_invalid_certs)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_page_size(self.page_size)
    }

    /// The hierarchical container these options address.
    pub fn container_spec(&self) -> ContainerSpec {
        ContainerSpec::hierarchical(&self.database, &self.container).with_throughput(self.throughput)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_retries(self.max_retries)
    }

    /// Build the client. Fails on a malformed endpoint or key.
    pub fn connect(&self) -> anyhow::Result<CosmosStore> {
        tracing::info!("Connecting to Cosmos DB at {}", self.endpoint);
        Ok(CosmosStore::new(&self.config())?)
    }
}

/// Options controlling synthetic session generation.
#[derive(Args, Clone, Debug, Default)]
pub struct GeneratorOpts {
    /// Tenant catalog YAML file (built-in catalog when omitted)
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Random seed for reproducible generation (same seed = same data)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl GeneratorOpts {
    pub fn catalog(&self) -> anyhow::Result<TenantCatalog> {
        match &self.catalog {
            Some(path) => TenantCatalog::from_file(path)
                .with_context(|| format!("Failed to load tenant catalog from {path:?}")),
            None => Ok(TenantCatalog::builtin()),
        }
    }

    pub fn generator(&self) -> anyhow::Result<SessionGenerator> {
        let catalog = self.catalog()?;
        tracing::debug!("Tenant catalog: {:?}", catalog.names());
        Ok(match self.seed {
            Some(seed) => SessionGenerator::with_seed(catalog, seed),
            None => SessionGenerator::new(catalog),
        })
    }
}
