//! Document store abstraction.
//!
//! This crate defines the `DocumentStore` trait that the loader and query
//! dispatcher are written against. A store holds containers whose items are
//! routed by a hierarchical partition key; it supports idempotent upserts,
//! point reads and paged, filtered queries whose pages carry a request
//! charge.
//!
//! Two implementations exist: [`MemoryStore`] in this crate, and the Cosmos
//! DB REST client in `cosmos-store`. Callers construct one store handle and
//! pass it by reference to whatever needs it.
//!
//! Every store call is expected to go through a [`RetryPolicy`], which
//! retries throttling and transient failures with bounded backoff and can
//! enforce a per-attempt deadline.

mod container;
mod error;
pub mod memory;
mod pager;
mod query;
mod retry;
mod traits;

pub use container::{ContainerHandle, ContainerSpec, Provisioned, DEFAULT_THROUGHPUT};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use pager::query_pages;
pub use query::{QueryPage, QueryParam, QueryScope, QuerySpec, ReadResponse, WriteResponse};
pub use retry::RetryPolicy;
pub use traits::DocumentStore;
