//! In-memory document store for testing and local runs.
//!
//! Items are grouped into logical partitions by their full hierarchical key
//! and kept in key order, so partition and prefix scopes only touch the
//! partitions they name while a cross-partition query walks the whole
//! container. Request charges follow that difference.

mod predicate;

pub use predicate::Predicate;

use crate::container::{ContainerHandle, ContainerSpec, Provisioned};
use crate::error::StoreError;
use crate::query::{QueryPage, QueryScope, QuerySpec, ReadResponse, WriteResponse};
use crate::traits::DocumentStore;
use async_trait::async_trait;
use hpk_core::PartitionKey;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default number of documents per query page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

const POINT_READ_CHARGE: f64 = 1.0;
const WRITE_BASE_CHARGE: f64 = 5.0;
const WRITE_CHARGE_PER_KB: f64 = 1.0;
const QUERY_PAGE_CHARGE: f64 = 2.8;
const SCANNED_ITEM_CHARGE: f64 = 0.05;
const RETURNED_ITEM_CHARGE: f64 = 0.4;

/// (full key segments, item id)
type ItemKey = (Vec<String>, String);

struct Container {
    key_paths: Vec<String>,
    items: BTreeMap<ItemKey, Vec<u8>>,
}

impl Container {
    fn key_fields(&self) -> impl Iterator<Item = &str> {
        self.key_paths.iter().map(|p| p.trim_start_matches('/'))
    }

    /// Items in scope, in key order.
    fn scan<'a>(
        &'a self,
        scope: &'a QueryScope,
    ) -> impl Iterator<Item = (&'a ItemKey, &'a Vec<u8>)> + 'a {
        let start: Bound<ItemKey> = match scope.key() {
            Some(key) => Bound::Included((key.segments().to_vec(), String::new())),
            None => Bound::Unbounded,
        };
        self.items
            .range((start, Bound::Unbounded))
            .take_while(move |((segments, _), _)| match scope {
                QueryScope::CrossPartition => true,
                _ => scope.includes(segments),
            })
    }
}

/// Thread-safe in-memory [`DocumentStore`].
#[derive(Clone)]
pub struct MemoryStore {
    containers: Arc<RwLock<HashMap<(String, String), Container>>>,
    page_size: usize,
    requests: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            containers: Arc::new(RwLock::new(HashMap::new())),
            page_size: DEFAULT_PAGE_SIZE,
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Set the number of documents per query page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of store calls made so far.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of items in a container.
    pub async fn item_count(&self, handle: &ContainerHandle) -> Result<usize, StoreError> {
        let containers = self.containers.read().await;
        let container = lookup(&containers, handle)?;
        Ok(container.items.len())
    }

    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn container_id(handle: &ContainerHandle) -> (String, String) {
    (handle.database.clone(), handle.container.clone())
}

fn lookup<'a>(
    containers: &'a HashMap<(String, String), Container>,
    handle: &ContainerHandle,
) -> Result<&'a Container, StoreError> {
    containers.get(&container_id(handle)).ok_or_else(|| {
        StoreError::NotFound(format!(
            "container {}/{}",
            handle.database, handle.container
        ))
    })
}

fn require_full_key(container: &Container, key: &PartitionKey) -> Result<(), StoreError> {
    if key.depth() != container.key_paths.len() {
        return Err(StoreError::BadRequest(format!(
            "partition key '{key}' has {} segments, container expects {}",
            key.depth(),
            container.key_paths.len()
        )));
    }
    Ok(())
}

fn parse_document(document: &[u8]) -> Result<Value, StoreError> {
    let value: Value = serde_json::from_slice(document)
        .map_err(|e| StoreError::BadRequest(format!("document is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(StoreError::BadRequest("document must be a JSON object".to_string()));
    }
    Ok(value)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<(ContainerHandle, Provisioned), StoreError> {
        self.record_request();
        spec.validate()?;

        let mut containers = self.containers.write().await;
        let handle = spec.handle();

        if let Some(existing) = containers.get(&container_id(&handle)) {
            spec.check_compatible(&existing.key_paths)?;
            tracing::debug!("Container {}/{} already exists", spec.database, spec.name);
            return Ok((handle, Provisioned::AlreadyExists));
        }

        containers.insert(
            container_id(&handle),
            Container {
                key_paths: spec.key_paths.clone(),
                items: BTreeMap::new(),
            },
        );
        tracing::debug!("Created container {}/{}", spec.database, spec.name);
        Ok((handle, Provisioned::Created))
    }

    async fn upsert(
        &self,
        handle: &ContainerHandle,
        key: &PartitionKey,
        document: &[u8],
    ) -> Result<WriteResponse, StoreError> {
        self.record_request();
        let value = parse_document(document)?;

        let id = match value.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            _ => {
                return Err(StoreError::BadRequest(
                    "document must have a non-empty string 'id'".to_string(),
                ))
            }
        };

        let mut containers = self.containers.write().await;
        let container = containers.get_mut(&container_id(handle)).ok_or_else(|| {
            StoreError::NotFound(format!(
                "container {}/{}",
                handle.database, handle.container
            ))
        })?;
        require_full_key(container, key)?;

        for (field, segment) in container.key_fields().zip(key.segments()) {
            if value.get(field).and_then(Value::as_str) != Some(segment.as_str()) {
                return Err(StoreError::BadRequest(format!(
                    "partition key '{key}' does not match document field '{field}'"
                )));
            }
        }

        container
            .items
            .insert((key.segments().to_vec(), id), document.to_vec());

        Ok(WriteResponse {
            request_charge: WRITE_BASE_CHARGE + WRITE_CHARGE_PER_KB * (document.len() as f64 / 1024.0),
        })
    }

    async fn point_read(
        &self,
        handle: &ContainerHandle,
        key: &PartitionKey,
        id: &str,
    ) -> Result<ReadResponse, StoreError> {
        self.record_request();
        let containers = self.containers.read().await;
        let container = lookup(&containers, handle)?;
        require_full_key(container, key)?;

        let document = container
            .items
            .get(&(key.segments().to_vec(), id.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("item '{id}' in partition '{key}'")))?;

        Ok(ReadResponse {
            document,
            request_charge: POINT_READ_CHARGE,
        })
    }

    async fn query_page(
        &self,
        handle: &ContainerHandle,
        scope: &QueryScope,
        spec: &QuerySpec,
        continuation: Option<&str>,
    ) -> Result<QueryPage, StoreError> {
        self.record_request();
        let predicate = Predicate::parse(spec)?;
        let offset: usize = match continuation {
            Some(token) => token
                .parse()
                .map_err(|_| StoreError::BadRequest(format!("invalid continuation '{token}'")))?,
            None => 0,
        };

        let containers = self.containers.read().await;
        let container = lookup(&containers, handle)?;
        if let Some(key) = scope.key() {
            if key.depth() > container.key_paths.len() {
                return Err(StoreError::BadRequest(format!(
                    "partition key '{key}' is deeper than the container key"
                )));
            }
        }

        let mut scanned = 0usize;
        let mut matched = Vec::new();
        for (_, document) in container.scan(scope) {
            scanned += 1;
            // Stored documents were validated on upsert.
            if let Ok(value) = serde_json::from_slice::<Value>(document) {
                if predicate.matches(&value) {
                    matched.push(document);
                }
            }
        }

        let documents: Vec<Vec<u8>> = matched
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|d| d.to_vec())
            .collect();
        let next = offset + documents.len();
        let continuation = (next < matched.len()).then(|| next.to_string());

        // The scan is charged once, on the first page.
        let scan_charge = if offset == 0 {
            SCANNED_ITEM_CHARGE * scanned as f64
        } else {
            0.0
        };

        Ok(QueryPage {
            request_charge: QUERY_PAGE_CHARGE
                + scan_charge
                + RETURNED_ITEM_CHARGE * documents.len() as f64,
            documents,
            continuation,
        })
    }
}
