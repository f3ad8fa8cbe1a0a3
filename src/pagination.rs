//! Page-by-page walking of GitLab list endpoints
//!
//! GitLab list endpoints are walked without trusting a total count or a
//! "next page" header: a page holding fewer items than requested is the last
//! one. When the item count is an exact multiple of the page size, this costs
//! one extra (empty) request.

use std::future::Future;

use compact_str::CompactString;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    client,
    lookup::ProjectLookup,
    metric::Accumulator,
    record::Normalize,
    result::CollectorError,
};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// One slice of a paginated result set. `page` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub per_page: u32,
    pub page: u32,
}

impl PageCursor {
    pub fn first(per_page: u32) -> Self {
        Self { per_page, page: 0 }
    }

    pub fn next(self) -> Self {
        Self { page: self.page + 1, ..self }
    }

    /// A short page ends the walk.
    pub fn is_last_page(&self, item_count: usize) -> bool {
        item_count < self.per_page as usize
    }

    /// GitLab numbers pages from 1.
    pub fn api_page(&self) -> u32 {
        self.page + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A short page was returned.
    Exhausted,
    /// Cancellation was observed between pages.
    Cancelled,
    /// A page fetch failed; the error went to the accumulator.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    pub stream: CompactString,
    pub pages: u32,
    pub records: usize,
    pub stop: StopReason,
}

/// Everything a walker needs besides the fetch operation itself.
pub struct StreamContext<'a> {
    pub name: CompactString,
    pub per_page: u32,
    pub cancel: &'a CancellationToken,
    pub lookup: &'a ProjectLookup,
    pub accumulator: &'a dyn Accumulator,
}

/// Fetches pages until a short page, emitting one measurement per item in
/// API order. Cancellation is checked before every fetch; a page that is
/// already in flight is still emitted. The first failing page ends the walk.
#[instrument(skip_all, fields(stream = %ctx.name, per_page = ctx.per_page))]
pub async fn walk_pages<T, F, Fut>(ctx: StreamContext<'_>, mut fetch: F) -> WalkSummary
where
    T: Normalize,
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = client::Result<Vec<T>>>,
{
    let mut cursor = PageCursor::first(ctx.per_page);
    let mut pages = 0;
    let mut records = 0;

    let stop = loop {
        if ctx.cancel.is_cancelled() {
            debug!(page = cursor.page, "Cancellation observed");
            break StopReason::Cancelled;
        }

        let items = match fetch(cursor).await {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    error = %e,
                    page = cursor.page,
                    retryable = e.is_retryable(),
                    "Page fetch failed, ending stream"
                );
                ctx.accumulator.report_error(CollectorError::PageFailed {
                    stream: ctx.name.clone(),
                    page: cursor.page,
                    source: e,
                });
                break StopReason::Failed;
            },
        };

        pages += 1;
        let count = items.len();
        for item in items {
            ctx.accumulator.emit(item.normalize(ctx.lookup));
        }
        records += count;
        debug!(page = cursor.page, count, "Page emitted");

        if cursor.is_last_page(count) {
            break StopReason::Exhausted;
        }
        cursor = cursor.next();
    };

    info!(pages, records, stop = ?stop, "Stream finished");
    WalkSummary { stream: ctx.name, pages, records, stop }
}
