//! Query dispatcher.

use crate::error::QueryError;
use crate::pattern::{KeyFilter, QueryPattern};
use document_store::{query_pages, ContainerHandle, DocumentStore, RetryPolicy};
use futures::stream::{self, BoxStream, StreamExt};
use hpk_core::{PartitionKey, UserSession};
use tracing::{debug, info};

/// A decoded record with the cost of the page it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryItem {
    pub session: UserSession,
    /// Request charge of the whole page
    pub request_charge: f64,
    /// 1-based page number
    pub page: usize,
}

/// One page of decoded results.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    /// 1-based page number
    pub number: usize,
    pub request_charge: f64,
    /// Decode failures are kept in place and do not affect other records
    pub records: Vec<Result<UserSession, QueryError>>,
}

/// Runs query patterns against one container.
pub struct QueryDispatcher<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    handle: ContainerHandle,
    retry: RetryPolicy,
}

impl<'a, S: DocumentStore + ?Sized> QueryDispatcher<'a, S> {
    pub fn new(store: &'a S, handle: ContainerHandle) -> Self {
        Self {
            store,
            handle,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Select a pattern from `filter` and dispatch it.
    ///
    /// Unsupported combinations fail here, before the store is contacted.
    pub fn dispatch_filter(
        &self,
        filter: &KeyFilter,
    ) -> Result<(QueryPattern, BoxStream<'a, Result<QueryItem, QueryError>>), QueryError> {
        let pattern = QueryPattern::select(filter)?;
        let items = self.dispatch(&pattern);
        Ok((pattern, items))
    }

    /// Lazy stream of decoded records.
    ///
    /// Nothing is sent until the stream is polled, and every call starts
    /// over from the first page. A record that fails to decode is yielded as
    /// `QueryError::Decode` and the stream carries on; a page that cannot be
    /// fetched is yielded as an error and ends the stream.
    pub fn dispatch(&self, pattern: &QueryPattern) -> BoxStream<'a, Result<QueryItem, QueryError>> {
        self.dispatch_pages(pattern)
            .flat_map(|page| {
                let items: Vec<Result<QueryItem, QueryError>> = match page {
                    Ok(page) => {
                        let (number, charge) = (page.number, page.request_charge);
                        page.records
                            .into_iter()
                            .map(|record| {
                                record.map(|session| QueryItem {
                                    session,
                                    request_charge: charge,
                                    page: number,
                                })
                            })
                            .collect()
                    }
                    Err(e) => vec![Err(e)],
                };
                stream::iter(items)
            })
            .boxed()
    }

    /// Lazy stream of decoded pages, for callers that account per page.
    pub fn dispatch_pages(
        &self,
        pattern: &QueryPattern,
    ) -> BoxStream<'a, Result<ResultPage, QueryError>> {
        info!("Dispatching {pattern}");

        let spec = match (pattern, pattern.query()) {
            (QueryPattern::PointRead { key, id }, _) => {
                let store = self.store;
                let handle = self.handle.clone();
                let retry = self.retry.clone();
                let key = key.clone();
                let id = id.clone();
                return stream::once(async move {
                    let item = read_point(store, &handle, &retry, &key, &id).await?;
                    Ok::<_, QueryError>(ResultPage {
                        number: item.page,
                        request_charge: item.request_charge,
                        records: vec![Ok(item.session)],
                    })
                })
                .boxed();
            }
            (_, Some(spec)) => spec,
            (_, None) => return stream::empty().boxed(),
        };

        debug!("Query: {} (scope: {:?})", spec.query, pattern.scope());
        query_pages(
            self.store,
            self.handle.clone(),
            pattern.scope(),
            spec,
            self.retry.clone(),
        )
        .enumerate()
        .map(|(index, page)| -> Result<ResultPage, QueryError> {
            let page = page?;
            debug!(
                "Page {} returned {} documents ({} RU)",
                index + 1,
                page.documents.len(),
                page.request_charge
            );
            Ok(ResultPage {
                number: index + 1,
                request_charge: page.request_charge,
                records: page.documents.iter().map(|doc| decode(doc)).collect(),
            })
        })
        .boxed()
    }

    /// Read one record by id. Any failure is fatal for the call.
    pub async fn point_read(&self, key: &PartitionKey, id: &str) -> Result<QueryItem, QueryError> {
        read_point(self.store, &self.handle, &self.retry, key, id).await
    }
}

async fn read_point<S: DocumentStore + ?Sized>(
    store: &S,
    handle: &ContainerHandle,
    retry: &RetryPolicy,
    key: &PartitionKey,
    id: &str,
) -> Result<QueryItem, QueryError> {
    if !key.is_full() {
        return Err(QueryError::InvalidRequest(format!(
            "point read of '{id}' needs a full partition key, got {key}"
        )));
    }

    let response = retry
        .run("point_read", || store.point_read(handle, key, id))
        .await
        .map_err(|source| QueryError::PointRead {
            id: id.to_string(),
            source,
        })?;

    let session = decode(&response.document)?;
    debug!("Point read of '{id}' in {key} ({} RU)", response.request_charge);
    Ok(QueryItem {
        session,
        request_charge: response.request_charge,
        page: 1,
    })
}

fn decode(document: &[u8]) -> Result<UserSession, QueryError> {
    serde_json::from_slice(document).map_err(|e| QueryError::Decode(e.to_string()))
}
