//! DocumentStore trait definition.

use crate::container::{ContainerHandle, ContainerSpec, Provisioned};
use crate::error::StoreError;
use crate::query::{QueryPage, QueryScope, QuerySpec, ReadResponse, WriteResponse};
use async_trait::async_trait;
use hpk_core::PartitionKey;

/// A document database with hierarchical partition keys.
///
/// # Usage Pattern
///
/// Callers take the store by reference and stay generic over it:
///
/// ```ignore
/// pub async fn load<S: DocumentStore + ?Sized>(store: &S, handle: &ContainerHandle) {
///     store.upsert(handle, &key, &bytes).await?;
/// }
/// ```
///
/// Implementations must be safe to call concurrently; writes for different
/// records are independent.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the database and container if they do not exist.
    ///
    /// An existing container counts as success, provided its partition key
    /// paths match `spec`; otherwise `StoreError::SchemaMismatch`.
    async fn ensure_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<(ContainerHandle, Provisioned), StoreError>;

    /// Insert or replace a document under its full partition key.
    ///
    /// The document must carry an `id` field; writing the same id under the
    /// same key twice leaves one item.
    async fn upsert(
        &self,
        handle: &ContainerHandle,
        key: &PartitionKey,
        document: &[u8],
    ) -> Result<WriteResponse, StoreError>;

    /// Read one document by id under its full partition key.
    async fn point_read(
        &self,
        handle: &ContainerHandle,
        key: &PartitionKey,
        id: &str,
    ) -> Result<ReadResponse, StoreError>;

    /// Fetch one page of a filtered query.
    ///
    /// `continuation` is the token from the previous page, or `None` for the
    /// first page.
    async fn query_page(
        &self,
        handle: &ContainerHandle,
        scope: &QueryScope,
        spec: &QuerySpec,
        continuation: Option<&str>,
    ) -> Result<QueryPage, StoreError>;
}
