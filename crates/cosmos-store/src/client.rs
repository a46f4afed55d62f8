//! `DocumentStore` over the Cosmos DB REST API.

use crate::auth::{http_date, MasterKeyCredential, ResourceType};
use crate::config::CosmosConfig;
use crate::error::{status_to_error, transport_error, CosmosError};
use async_trait::async_trait;
use chrono::Utc;
use document_store::{
    ContainerHandle, ContainerSpec, DocumentStore, Provisioned, QueryPage, QueryScope, QuerySpec,
    ReadResponse, StoreError, WriteResponse,
};
use hpk_core::PartitionKey;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// REST API version sent with every request
pub const API_VERSION: &str = "2020-07-15";

const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_REQUEST_CHARGE: &str = "x-ms-request-charge";
const HEADER_CONTINUATION: &str = "x-ms-continuation";

/// Cosmos DB account client.
pub struct CosmosStore {
    http: Client,
    endpoint: Url,
    credential: MasterKeyCredential,
    page_size: u32,
}

/// One signed request.
struct Request<'a> {
    method: Method,
    resource_type: ResourceType,
    /// Link covered by the signature
    resource_link: String,
    /// URL path segments
    path: Vec<&'a str>,
    headers: Vec<(&'static str, String)>,
    body: Option<(&'static str, Vec<u8>)>,
}

impl<'a> Request<'a> {
    fn new(
        method: Method,
        resource_type: ResourceType,
        resource_link: String,
        path: Vec<&'a str>,
    ) -> Self {
        Self {
            method,
            resource_type,
            resource_link,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn body(mut self, content_type: &'static str, body: Vec<u8>) -> Self {
        self.body = Some((content_type, body));
        self
    }
}

struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl RawResponse {
    fn request_charge(&self) -> f64 {
        self.headers
            .get(HEADER_REQUEST_CHARGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0)
    }

    fn continuation(&self) -> Option<String> {
        self.headers
            .get(HEADER_CONTINUATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn into_error(self, resource: &str) -> StoreError {
        let body = String::from_utf8_lossy(&self.body);
        status_to_error(self.status, &self.headers, &body, resource)
    }
}

#[derive(Serialize)]
struct PartitionKeyDefinition<'a> {
    paths: &'a [String],
    kind: &'static str,
    version: u8,
}

#[derive(Serialize)]
struct CreateContainer<'a> {
    id: &'a str,
    #[serde(rename = "partitionKey")]
    partition_key: PartitionKeyDefinition<'a>,
}

#[derive(Deserialize)]
struct ContainerResource {
    #[serde(rename = "partitionKey")]
    partition_key: ExistingPartitionKey,
}

#[derive(Deserialize)]
struct ExistingPartitionKey {
    paths: Vec<String>,
}

#[derive(Deserialize)]
struct DocumentsResponse {
    #[serde(rename = "Documents")]
    documents: Vec<serde_json::Value>,
}

impl CosmosStore {
    pub fn new(config: &CosmosConfig) -> Result<Self, CosmosError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| CosmosError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if endpoint.cannot_be_a_base() || !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CosmosError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                reason: "expected an http or https URL".to_string(),
            });
        }

        let credential = MasterKeyCredential::from_base64(&config.key)?;

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification disabled for {endpoint}");
        }
        let http = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            credential,
            page_size: config.page_size.max(1),
        })
    }

    async fn send(&self, request: Request<'_>) -> Result<RawResponse, StoreError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Other(format!("endpoint {} cannot hold a path", self.endpoint)))?
            .pop_if_empty()
            .extend(&request.path);

        let date = http_date(Utc::now());
        let authorization = self.credential.authorization(
            request.method.as_str(),
            request.resource_type,
            &request.resource_link,
            &date,
        );

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header("authorization", authorization)
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some((content_type, body)) = request.body {
            builder = builder.header("content-type", content_type).body(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport_error)?.to_vec();

        let raw = RawResponse {
            status,
            headers,
            body,
        };
        tracing::debug!(
            "{} {} -> {} ({} RU)",
            request.method,
            request.resource_link,
            status,
            raw.request_charge()
        );
        Ok(raw)
    }

    async fn create_database(&self, database: &str) -> Result<Provisioned, StoreError> {
        let request = Request::new(Method::POST, ResourceType::Database, String::new(), vec!["dbs"])
            .body("application/json", to_json(&serde_json::json!({ "id": database }))?);
        let response = self.send(request).await?;

        match response.status {
            s if s.is_success() => {
                tracing::info!("Created database '{database}'");
                Ok(Provisioned::Created)
            }
            StatusCode::CONFLICT => Ok(Provisioned::AlreadyExists),
            _ => Err(response.into_error(&format!("dbs/{database}"))),
        }
    }

    async fn container_key_paths(
        &self,
        database: &str,
        container: &str,
    ) -> Result<Vec<String>, StoreError> {
        let link = format!("dbs/{database}/colls/{container}");
        let request = Request::new(
            Method::GET,
            ResourceType::Container,
            link.clone(),
            vec!["dbs", database, "colls", container],
        );
        let response = self.send(request).await?;
        if !response.status.is_success() {
            return Err(response.into_error(&link));
        }

        let resource: ContainerResource = from_json(&response.body, &link)?;
        Ok(resource.partition_key.paths)
    }
}

#[async_trait]
impl DocumentStore for CosmosStore {
    async fn ensure_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<(ContainerHandle, Provisioned), StoreError> {
        spec.validate()?;
        self.create_database(&spec.database).await?;

        let body = CreateContainer {
            id: &spec.name,
            partition_key: PartitionKeyDefinition {
                paths: &spec.key_paths,
                kind: if spec.key_paths.len() > 1 {
                    "MultiHash"
                } else {
                    "Hash"
                },
                version: 2,
            },
        };
        let link = format!("dbs/{}", spec.database);
        let request = Request::new(
            Method::POST,
            ResourceType::Container,
            link,
            vec!["dbs", spec.database.as_str(), "colls"],
        )
        .header("x-ms-offer-throughput", spec.throughput.to_string())
        .body("application/json", to_json(&body)?);
        let response = self.send(request).await?;

        match response.status {
            s if s.is_success() => {
                tracing::info!(
                    "Created container '{}' with partition key paths {:?} ({} RU/s)",
                    spec.name,
                    spec.key_paths,
                    spec.throughput
                );
                Ok((spec.handle(), Provisioned::Created))
            }
            StatusCode::CONFLICT => {
                let existing = self
                    .container_key_paths(&spec.database, &spec.name)
                    .await?;
                spec.check_compatible(&existing)?;
                tracing::info!("Container '{}' already exists", spec.name);
                Ok((spec.handle(), Provisioned::AlreadyExists))
            }
            _ => Err(response.into_error(&format!("dbs/{}/colls/{}", spec.database, spec.name))),
        }
    }

    async fn upsert(
        &self,
        handle: &ContainerHandle,
        key: &PartitionKey,
        document: &[u8],
    ) -> Result<WriteResponse, StoreError> {
        let link = collection_link(handle);
        let request = Request::new(
            Method::POST,
            ResourceType::Document,
            link.clone(),
            vec!["dbs", handle.database.as_str(), "colls", handle.container.as_str(), "docs"],
        )
        .header("x-ms-documentdb-is-upsert", "True")
        .header(HEADER_PARTITION_KEY, key.to_json_array())
        .body("application/json", document.to_vec());
        let response = self.send(request).await?;

        if !response.status.is_success() {
            return Err(response.into_error(&format!("{link} partition {key}")));
        }
        Ok(WriteResponse {
            request_charge: response.request_charge(),
        })
    }

    async fn point_read(
        &self,
        handle: &ContainerHandle,
        key: &PartitionKey,
        id: &str,
    ) -> Result<ReadResponse, StoreError> {
        let link = format!("{}/docs/{id}", collection_link(handle));
        let request = Request::new(
            Method::GET,
            ResourceType::Document,
            link.clone(),
            vec!["dbs", handle.database.as_str(), "colls", handle.container.as_str(), "docs", id],
        )
        .header(HEADER_PARTITION_KEY, key.to_json_array());
        let response = self.send(request).await?;

        if !response.status.is_success() {
            return Err(response.into_error(&format!("item '{id}' in partition {key}")));
        }
        Ok(ReadResponse {
            request_charge: response.request_charge(),
            document: response.body,
        })
    }

    async fn query_page(
        &self,
        handle: &ContainerHandle,
        scope: &QueryScope,
        spec: &QuerySpec,
        continuation: Option<&str>,
    ) -> Result<QueryPage, StoreError> {
        let link = collection_link(handle);
        let mut request = Request::new(
            Method::POST,
            ResourceType::Document,
            link.clone(),
            vec!["dbs", handle.database.as_str(), "colls", handle.container.as_str(), "docs"],
        )
        .header("x-ms-documentdb-isquery", "True")
        .header("x-ms-max-item-count", self.page_size.to_string());

        // Prefix scopes fan out; the query filter keeps them inside the prefix.
        request = match scope {
            QueryScope::Partition(key) => request.header(HEADER_PARTITION_KEY, key.to_json_array()),
            QueryScope::Prefix(_) | QueryScope::CrossPartition => {
                request.header("x-ms-documentdb-query-enablecrosspartition", "True")
            }
        };
        if let Some(token) = continuation {
            request = request.header(HEADER_CONTINUATION, token);
        }
        let request = request.body("application/query+json", to_json(spec)?);
        let response = self.send(request).await?;

        if !response.status.is_success() {
            return Err(response.into_error(&link));
        }

        let charge = response.request_charge();
        let next = response.continuation();
        let page: DocumentsResponse = from_json(&response.body, &link)?;
        let documents = page
            .documents
            .iter()
            .map(to_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryPage {
            documents,
            request_charge: charge,
            continuation: next,
        })
    }
}

fn collection_link(handle: &ContainerHandle) -> String {
    format!("dbs/{}/colls/{}", handle.database, handle.container)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::Other(format!("failed to encode request: {e}")))
}

fn from_json<'de, T: Deserialize<'de>>(body: &'de [u8], resource: &str) -> Result<T, StoreError> {
    serde_json::from_slice(body)
        .map_err(|e| StoreError::Other(format!("unexpected response from {resource}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "dGVzdC1tYXN0ZXIta2V5LTAxMjM0NTY3ODlhYmNkZWY=";

    #[test]
    fn test_rejects_bad_endpoints() {
        let config = CosmosConfig::new("not a url", KEY);
        assert!(matches!(
            CosmosStore::new(&config),
            Err(CosmosError::InvalidEndpoint { .. })
        ));

        let config = CosmosConfig::new("mailto:someone@example.com", KEY);
        assert!(matches!(
            CosmosStore::new(&config),
            Err(CosmosError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_key() {
        let config = CosmosConfig::new("https://localhost:8081/", "%%%");
        assert!(matches!(
            CosmosStore::new(&config),
            Err(CosmosError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_create_container_body() {
        let paths = vec!["/tenantId".to_string(), "/userId".to_string()];
        let body = CreateContainer {
            id: "sessions",
            partition_key: PartitionKeyDefinition {
                paths: &paths,
                kind: "MultiHash",
                version: 2,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "id": "sessions",
                "partitionKey": {"paths": ["/tenantId", "/userId"], "kind": "MultiHash", "version": 2}
            })
        );
    }
}
