//! Integration tests against an in-process fake of the Cosmos DB gateway.
//!
//! The fake verifies master key signatures, so these tests also cover the
//! resource links and headers the client signs.

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cosmos_store::auth::{MasterKeyCredential, ResourceType};
use cosmos_store::{CosmosConfig, CosmosStore};
use document_store::{
    query_pages, ContainerSpec, DocumentStore, Provisioned, QueryScope, QuerySpec, RetryPolicy,
    StoreError,
};
use futures::TryStreamExt;
use hpk_core::PartitionKey;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

const KEY: &str = "dGVzdC1tYXN0ZXIta2V5LTAxMjM0NTY3ODlhYmNkZWY=";
const OTHER_KEY: &str = "b3RoZXIta2V5";

#[derive(Default)]
struct Gateway {
    databases: HashSet<String>,
    containers: HashMap<(String, String), Vec<String>>,
    /// (partition key header, id) -> document
    documents: BTreeMap<(String, String), Value>,
    throttle_next: u32,
    /// Headers of every authorized request, in order
    seen: Vec<HeaderMap>,
}

type Shared = Arc<Mutex<Gateway>>;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resource type and signed link for a request path.
fn resource_of(path: &str) -> (ResourceType, String) {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let (kind, link) = if segments.len() % 2 == 0 {
        (segments[segments.len() - 2], segments.join("/"))
    } else {
        (segments[segments.len() - 1], segments[..segments.len() - 1].join("/"))
    };
    let kind = match kind {
        "dbs" => ResourceType::Database,
        "colls" => ResourceType::Container,
        _ => ResourceType::Document,
    };
    (kind, link)
}

async fn verify_signature(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let credential = MasterKeyCredential::from_base64(KEY).unwrap();
    let headers = request.headers().clone();
    let (kind, link) = resource_of(request.uri().path());

    let authorized = match (header(&headers, "authorization"), header(&headers, "x-ms-date")) {
        (Some(auth), Some(date)) => {
            auth == credential.authorization(request.method().as_str(), kind, &link, date)
        }
        _ => false,
    };
    if !authorized || header(&headers, "x-ms-version").is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": "Unauthorized", "message": "The input authorization token can't serve the request."})),
        )
            .into_response();
    }

    state.lock().unwrap().seen.push(headers);
    next.run(request).await
}

fn charged(status: StatusCode, charge: &str, body: Value) -> Response {
    (status, [("x-ms-request-charge", charge.to_string())], Json(body)).into_response()
}

async fn create_database(State(state): State<Shared>, body: Bytes) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    if state.lock().unwrap().databases.insert(id.clone()) {
        charged(StatusCode::CREATED, "1", json!({ "id": id }))
    } else {
        charged(StatusCode::CONFLICT, "1", json!({"code": "Conflict", "message": "exists"}))
    }
}

async fn create_container(
    State(state): State<Shared>,
    Path(db): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(header(&headers, "x-ms-offer-throughput").is_some());
    assert_eq!(body["partitionKey"]["version"], 2);

    let id = body["id"].as_str().unwrap().to_string();
    let paths: Vec<String> = serde_json::from_value(body["partitionKey"]["paths"].clone()).unwrap();

    let mut gateway = state.lock().unwrap();
    if !gateway.databases.contains(&db) {
        return charged(StatusCode::NOT_FOUND, "1", json!({"code": "NotFound", "message": db}));
    }
    if gateway.containers.contains_key(&(db.clone(), id.clone())) {
        return charged(StatusCode::CONFLICT, "1", json!({"code": "Conflict", "message": "exists"}));
    }
    gateway.containers.insert((db, id.clone()), paths.clone());
    charged(
        StatusCode::CREATED,
        "1",
        json!({"id": id, "partitionKey": {"paths": paths, "kind": "MultiHash", "version": 2}}),
    )
}

async fn read_container(
    State(state): State<Shared>,
    Path((db, coll)): Path<(String, String)>,
) -> Response {
    match state.lock().unwrap().containers.get(&(db, coll.clone())) {
        Some(paths) => charged(
            StatusCode::OK,
            "1",
            json!({"id": coll, "partitionKey": {"paths": paths, "kind": "MultiHash", "version": 2}}),
        ),
        None => charged(StatusCode::NOT_FOUND, "1", json!({"code": "NotFound", "message": coll})),
    }
}

async fn post_documents(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    let mut gateway = state.lock().unwrap();

    if header(&headers, "x-ms-documentdb-isquery") != Some("True") {
        assert_eq!(header(&headers, "x-ms-documentdb-is-upsert"), Some("True"));
        let key = header(&headers, "x-ms-documentdb-partitionkey").unwrap().to_string();
        let document: Value = serde_json::from_slice(&body).unwrap();
        let id = document["id"].as_str().unwrap().to_string();
        gateway.documents.insert((key, id), document.clone());
        return charged(StatusCode::CREATED, "5.71", document);
    }

    if gateway.throttle_next > 0 {
        gateway.throttle_next -= 1;
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [("x-ms-retry-after-ms", "10")],
            Json(json!({"code": "429", "message": "Request rate is large"})),
        )
            .into_response();
    }

    assert_eq!(header(&headers, "content-type"), Some("application/query+json"));
    let query: Value = serde_json::from_slice(&body).unwrap();
    let key = header(&headers, "x-ms-documentdb-partitionkey");
    if key.is_none() {
        assert_eq!(
            header(&headers, "x-ms-documentdb-query-enablecrosspartition"),
            Some("True")
        );
    }

    // Every parameter `@field` filters on the document field of the same name.
    let params = query["parameters"].as_array().cloned().unwrap_or_default();
    let matching: Vec<Value> = gateway
        .documents
        .iter()
        .filter(|((pk, _), _)| key.map_or(true, |k| k == pk))
        .filter(|(_, doc)| {
            params.iter().all(|p| {
                let field = p["name"].as_str().unwrap().trim_start_matches('@');
                doc[field] == p["value"]
            })
        })
        .map(|(_, doc)| doc.clone())
        .collect();

    let page_size: usize = header(&headers, "x-ms-max-item-count").unwrap().parse().unwrap();
    let offset: usize = header(&headers, "x-ms-continuation").map_or(0, |c| c.parse().unwrap());
    let end = (offset + page_size).min(matching.len());
    let page = matching[offset.min(end)..end].to_vec();

    let mut response = charged(StatusCode::OK, "2.83", json!({ "Documents": page, "_count": page.len() }));
    if end < matching.len() {
        response
            .headers_mut()
            .insert("x-ms-continuation", end.to_string().parse().unwrap());
    }
    response
}

async fn read_document(
    State(state): State<Shared>,
    Path((_db, _coll, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let key = header(&headers, "x-ms-documentdb-partitionkey").unwrap().to_string();
    match state.lock().unwrap().documents.get(&(key, id)) {
        Some(document) => charged(StatusCode::OK, "1", document.clone()),
        None => charged(
            StatusCode::NOT_FOUND,
            "1",
            json!({"code": "NotFound", "message": "Entity with the specified id does not exist in the system."}),
        ),
    }
}

/// Start the fake gateway on an ephemeral port.
async fn start_gateway() -> anyhow::Result<(String, Shared)> {
    let state: Shared = Arc::new(Mutex::new(Gateway::default()));
    let app = Router::new()
        .route("/dbs", post(create_database))
        .route("/dbs/:db/colls", post(create_container))
        .route("/dbs/:db/colls/:coll", get(read_container))
        .route("/dbs/:db/colls/:coll/docs", post(post_documents))
        .route("/dbs/:db/colls/:coll/docs/:id", get(read_document))
        .layer(ServiceBuilder::new().layer(middleware::from_fn_with_state(
            state.clone(),
            verify_signature,
        )))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok((format!("http://{addr}/"), state))
}

fn session_doc(id: &str, tenant: &str, user: &str, session: &str) -> (PartitionKey, Vec<u8>) {
    let key = PartitionKey::build([tenant, user, session]).unwrap();
    let doc = json!({
        "id": id,
        "tenantId": tenant,
        "userId": user,
        "sessionId": session,
        "activity": "login",
        "timestamp": "2025-01-01T00:00:00Z",
    });
    (key, serde_json::to_vec(&doc).unwrap())
}

#[tokio::test]
async fn test_ensure_container_is_idempotent() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
    let (endpoint, _state) = start_gateway().await.unwrap();
    let store = CosmosStore::new(&CosmosConfig::new(endpoint, KEY)).unwrap();

    let spec = ContainerSpec::hierarchical("sessions-db", "sessions");
    let (handle, outcome) = store.ensure_container(&spec).await.unwrap();
    assert_eq!(outcome, Provisioned::Created);
    assert_eq!(handle.key_depth(), 3);

    let (_, outcome) = store.ensure_container(&spec).await.unwrap();
    assert_eq!(outcome, Provisioned::AlreadyExists);

    let flat = spec.clone().with_key_paths(vec!["/tenantId".to_string()]);
    let err = store.ensure_container(&flat).await.unwrap_err();
    assert!(matches!(err, StoreError::SchemaMismatch { .. }), "{err}");
}

#[tokio::test]
async fn test_upsert_and_point_read() {
    let (endpoint, state) = start_gateway().await.unwrap();
    let store = CosmosStore::new(&CosmosConfig::new(endpoint, KEY)).unwrap();
    let (handle, _) = store
        .ensure_container(&ContainerSpec::hierarchical("db", "sessions"))
        .await
        .unwrap();

    let (key, doc) = session_doc("r1", "MidMarket-Inc", "user-192", "session-5af6ab47");
    let write = store.upsert(&handle, &key, &doc).await.unwrap();
    assert_eq!(write.request_charge, 5.71);

    let last = state.lock().unwrap().seen.last().cloned().unwrap();
    assert_eq!(
        header(&last, "x-ms-documentdb-partitionkey"),
        Some(r#"["MidMarket-Inc","user-192","session-5af6ab47"]"#)
    );

    let read = store.point_read(&handle, &key, "r1").await.unwrap();
    let value: Value = serde_json::from_slice(&read.document).unwrap();
    assert_eq!(value["userId"], "user-192");
    assert_eq!(read.request_charge, 1.0);

    let err = store.point_read(&handle, &key, "missing").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_query_pages_follow_continuations() {
    let (endpoint, state) = start_gateway().await.unwrap();
    let store = CosmosStore::new(&CosmosConfig::new(endpoint, KEY).with_page_size(2)).unwrap();
    let (handle, _) = store
        .ensure_container(&ContainerSpec::hierarchical("db", "sessions"))
        .await
        .unwrap();

    for i in 0..5 {
        let (key, doc) = session_doc(&format!("e{i}"), "Enterprise-Corp", "user-1000", &format!("session-{i}"));
        store.upsert(&handle, &key, &doc).await.unwrap();
    }
    let (key, doc) = session_doc("s1", "SmallBiz-LLC", "user-10", "session-x");
    store.upsert(&handle, &key, &doc).await.unwrap();

    let spec = QuerySpec::new("SELECT * FROM c WHERE c.tenantId = @tenantId")
        .param("@tenantId", "Enterprise-Corp");
    let pages: Vec<_> = query_pages(
        &store,
        handle.clone(),
        QueryScope::Prefix(PartitionKey::build(["Enterprise-Corp"]).unwrap()),
        spec,
        RetryPolicy::none(),
    )
    .try_collect()
    .await
    .unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(pages.iter().map(|p| p.documents.len()).sum::<usize>(), 5);
    assert!(pages.iter().all(|p| p.request_charge == 2.83));

    let last = state.lock().unwrap().seen.last().cloned().unwrap();
    assert_eq!(header(&last, "x-ms-continuation"), Some("4"));
    assert_eq!(
        header(&last, "x-ms-documentdb-query-enablecrosspartition"),
        Some("True")
    );
}

#[tokio::test]
async fn test_full_key_query_targets_one_partition() {
    let (endpoint, state) = start_gateway().await.unwrap();
    let store = CosmosStore::new(&CosmosConfig::new(endpoint, KEY)).unwrap();
    let (handle, _) = store
        .ensure_container(&ContainerSpec::hierarchical("db", "sessions"))
        .await
        .unwrap();

    let (key, doc) = session_doc("r1", "LocalShops-SME", "user-42", "session-aa");
    store.upsert(&handle, &key, &doc).await.unwrap();
    let (other, doc) = session_doc("r2", "LocalShops-SME", "user-42", "session-bb");
    store.upsert(&handle, &other, &doc).await.unwrap();

    let page = store
        .query_page(
            &handle,
            &QueryScope::Partition(key.clone()),
            &QuerySpec::new("SELECT * FROM c"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(page.documents.len(), 1);
    assert!(page.continuation.is_none());

    let last = state.lock().unwrap().seen.last().cloned().unwrap();
    assert_eq!(
        header(&last, "x-ms-documentdb-partitionkey"),
        Some(key.to_json_array().as_str())
    );
    assert!(header(&last, "x-ms-documentdb-query-enablecrosspartition").is_none());
}

#[tokio::test]
async fn test_throttling_is_retried() {
    let (endpoint, state) = start_gateway().await.unwrap();
    let store = CosmosStore::new(&CosmosConfig::new(endpoint, KEY)).unwrap();
    let (handle, _) = store
        .ensure_container(&ContainerSpec::hierarchical("db", "sessions"))
        .await
        .unwrap();

    let spec = QuerySpec::new("SELECT * FROM c");
    let scope = QueryScope::CrossPartition;
    state.lock().unwrap().throttle_next = 1;
    let err = store
        .query_page(&handle, &scope, &spec, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Throttled {
            retry_after: Some(Duration::from_millis(10))
        }
    );

    state.lock().unwrap().throttle_next = 2;
    let page = RetryPolicy::default()
        .run("query_page", || {
            store.query_page(&handle, &scope, &spec, None)
        })
        .await
        .unwrap();
    assert!(page.documents.is_empty());
}

#[tokio::test]
async fn test_wrong_key_is_unauthorized() {
    let (endpoint, _state) = start_gateway().await.unwrap();
    let store = CosmosStore::new(&CosmosConfig::new(endpoint, OTHER_KEY)).unwrap();

    let err = store
        .ensure_container(&ContainerSpec::hierarchical("db", "sessions"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Unauthorized("The input authorization token can't serve the request.".to_string())
    );
}
