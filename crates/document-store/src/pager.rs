//! Lazy paging over query results.

use crate::container::ContainerHandle;
use crate::error::StoreError;
use crate::query::{QueryPage, QueryScope, QuerySpec};
use crate::retry::RetryPolicy;
use crate::traits::DocumentStore;
use futures::stream::{self, BoxStream, StreamExt};

enum PagerState {
    Start,
    Continue(String),
    Done,
}

/// Stream the pages of a query, following continuation tokens.
///
/// Nothing is sent to the store until the stream is polled. Each page fetch
/// goes through `retry`; a page that still fails is yielded as an error and
/// ends the stream. Calling this again restarts the query from the first
/// page.
pub fn query_pages<'a, S>(
    store: &'a S,
    handle: ContainerHandle,
    scope: QueryScope,
    spec: QuerySpec,
    retry: RetryPolicy,
) -> BoxStream<'a, Result<QueryPage, StoreError>>
where
    S: DocumentStore + ?Sized,
{
    stream::unfold(PagerState::Start, move |state| {
        let handle = handle.clone();
        let scope = scope.clone();
        let spec = spec.clone();
        let retry = retry.clone();

        async move {
            let continuation = match state {
                PagerState::Done => return None,
                PagerState::Start => None,
                PagerState::Continue(token) => Some(token),
            };

            let result = retry
                .run("query_page", || {
                    store.query_page(&handle, &scope, &spec, continuation.as_deref())
                })
                .await;

            match result {
                Ok(page) => {
                    let next = match &page.continuation {
                        Some(token) => PagerState::Continue(token.clone()),
                        None => PagerState::Done,
                    };
                    Some((Ok(page), next))
                }
                Err(e) => Some((Err(e), PagerState::Done)),
            }
        }
    })
    .boxed()
}
