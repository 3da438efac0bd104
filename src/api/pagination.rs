//! Offset cursor walking for paginated listings.
//!
//! A walk starts at offset 0, accumulates each page's results, and follows
//! `next_offset` while the server reports `has_more`. A failed page fetch
//! ends the walk with the items accumulated so far: failures truncate the
//! result set and are never retried. Re-running the export picks up
//! whatever a truncated run missed, because the writer skips ids that are
//! already on disk.

use std::future::Future;

use tracing::{debug, warn};

use super::ApiError;
use super::models::Page;

/// Collects every item of a paginated listing.
///
/// `fetch` is called with the offset of the page to load and is awaited to
/// completion before the next call; there is exactly one request in flight
/// at any time.
pub async fn fetch_all_pages<T, F, Fut>(mut fetch: F) -> Vec<T>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut items = Vec::new();
    let mut offset = 0;

    loop {
        let page = match fetch(offset).await {
            Ok(page) => page,
            Err(error) => {
                warn!(%error, offset, "page fetch failed, keeping items collected so far");
                break;
            }
        };

        let count = page.results.len();
        items.extend(page.results);
        debug!(count, total = items.len(), offset, "retrieved page");

        if !page.has_more {
            break;
        }
        match page.next_offset {
            Some(next) => offset = next,
            None => {
                // has_more without a cursor would re-fetch the same page forever.
                warn!(offset, "server reported more results but no next offset");
                break;
            }
        }
    }

    items
}
