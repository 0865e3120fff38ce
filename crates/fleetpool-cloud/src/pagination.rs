//! Continuation-token pagination
//!
//! Every listing call in the supported backends returns an opaque token that
//! must be passed to the next call. Pages are fetched strictly in order.

use crate::error::Result;
use std::future::Future;

/// One page of a paginated listing call
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Token for the next page; `None` (or empty) on the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// A page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Fetch pages until the continuation token runs out and concatenate the items.
///
/// `fetch` receives `None` for the first page and the previous page's token
/// afterwards. The first error aborts the loop and is returned unchanged.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let mut page = 0usize;

    loop {
        let Page {
            items: batch,
            next_token,
        } = fetch(token.take()).await?;
        page += 1;
        tracing::debug!(page, count = batch.len(), "Fetched page");
        items.extend(batch);

        match next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => break,
        }
    }

    Ok(items)
}
