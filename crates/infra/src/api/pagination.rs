//! Pagination engine
//!
//! A [`PageWalker`] is seeded with the first response and fetches further
//! pages on demand according to the service's dialect:
//!
//! | Dialect | Advance | Stop |
//! |---|---|---|
//! | page number | `page + 1` | `page >= total_pages`, empty page, repeated page |
//! | offset | `offset = next_offset` | `next_offset` null or absent, empty page |
//! | bare list | `page + 1` | empty page, repeated page, `page >= total_pages` when reported |
//!
//! Caller caps on items and pages win over the dialect. A walker never
//! resumes once it has stopped; walking again means building a new one.

use futures::stream::{self, Stream};
use serde_json::Value;
use tracing::debug;
use zscaler_domain::{PaginationDialect, PaginationProfile, RequestDescriptor, Result};

use super::executor::Executor;

/// Keys that hold the item list inside an object body, in lookup order
pub const ITEM_KEYS: [&str; 4] = ["list", "items", "data", "records"];

/// Caller caps for a walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLimits {
    /// Stop once this many items have been yielded; the last page is
    /// truncated to fit
    pub max_items: Option<usize>,
    /// Stop after this many pages, the first one included
    pub max_pages: Option<usize>,
}

/// Items of one page
///
/// A bare array is the list itself. An object holds it under one of
/// [`ITEM_KEYS`]. Anything else is an empty page.
pub fn extract_items(body: Option<&Value>) -> Vec<Value> {
    match body {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => ITEM_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// `total_pages` metadata; ZPA sends it as a string
pub fn total_pages(body: Option<&Value>) -> Option<u64> {
    match body?.get("total_pages")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `next_offset` metadata as a query value
pub fn next_offset(body: Option<&Value>) -> Option<String> {
    match body?.get("next_offset")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Page(u64),
    Offset(Option<String>),
}

/// One walk over a paginated collection
#[derive(Debug)]
pub struct PageWalker {
    executor: Executor,
    request: RequestDescriptor,
    profile: PaginationProfile,
    limits: PageLimits,
    cursor: Cursor,
    pending: Option<Vec<Value>>,
    previous: Option<Vec<Value>>,
    items_fetched: usize,
    pages_fetched: usize,
    done: bool,
}

impl PageWalker {
    /// Seed a walk with the response to `request`
    pub fn new(
        executor: Executor,
        request: RequestDescriptor,
        first_body: Option<&Value>,
        limits: PageLimits,
    ) -> Self {
        let profile = request.service().pagination();
        let cursor = match profile.dialect {
            PaginationDialect::Offset => Cursor::Offset(None),
            PaginationDialect::PageNumber | PaginationDialect::BareList => Cursor::Page(
                request
                    .query_param(profile.page_param)
                    .and_then(|p| p.trim().parse().ok())
                    .unwrap_or(1),
            ),
        };

        let mut walker = Self {
            executor,
            request,
            profile,
            limits,
            cursor,
            pending: None,
            previous: None,
            items_fetched: 0,
            pages_fetched: 0,
            done: false,
        };
        walker.pending = walker.accept(extract_items(first_body), first_body);
        walker
    }

    /// Items accepted so far, after truncation to `max_items`
    pub const fn items_fetched(&self) -> usize {
        self.items_fetched
    }

    /// Pages that contributed items, the first one included
    pub const fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// `false` once the walk has stopped and no accepted page is pending
    pub const fn has_next(&self) -> bool {
        self.pending.is_some() || !self.done
    }

    /// Next page of items, or `None` once the walk has stopped
    ///
    /// # Errors
    /// A failed page fetch aborts the walk with the request's error.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if let Some(items) = self.pending.take() {
            return Ok(Some(items));
        }
        if self.done {
            return Ok(None);
        }

        let page_param = self.profile.page_param;
        let request = match &mut self.cursor {
            Cursor::Page(page) => {
                *page += 1;
                self.request.clone().with_query_param(page_param, page.to_string())
            }
            Cursor::Offset(Some(offset)) => {
                self.request.clone().with_query_param(page_param, offset.clone())
            }
            Cursor::Offset(None) => {
                self.done = true;
                return Ok(None);
            }
        }
        .with_new_correlation_id();

        debug!(
            url = request.url(),
            service = %request.service(),
            cursor = ?self.cursor,
            pages_fetched = self.pages_fetched,
            "Fetching next page"
        );
        let body = match self.executor.fetch_page(&request).await {
            Ok(body) => body,
            Err(err) => {
                self.done = true;
                return Err(err);
            }
        };
        Ok(self.accept(extract_items(body.as_ref()), body.as_ref()))
    }

    /// Walk to the end and return every item in order
    ///
    /// # Errors
    /// Propagates the first failed page fetch.
    pub async fn collect_all(&mut self) -> Result<Vec<Value>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }

    /// Pages as a stream
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Value>>> {
        stream::try_unfold(self, |mut walker| async move {
            Ok(walker.next_page().await?.map(|page| (page, walker)))
        })
    }

    /// Apply the stop rules to a freshly received page
    fn accept(&mut self, items: Vec<Value>, body: Option<&Value>) -> Option<Vec<Value>> {
        if items.is_empty() {
            debug!(pages_fetched = self.pages_fetched, "Empty page, pagination finished");
            self.done = true;
            return None;
        }
        let repeat_guard = !matches!(self.profile.dialect, PaginationDialect::Offset);
        if repeat_guard && self.previous.as_ref() == Some(&items) {
            debug!(pages_fetched = self.pages_fetched, "Repeated page, pagination finished");
            self.done = true;
            return None;
        }
        self.previous = Some(items.clone());

        let mut items = items;
        if let Some(max) = self.limits.max_items {
            items.truncate(max.saturating_sub(self.items_fetched));
            if items.is_empty() {
                self.done = true;
                return None;
            }
        }
        self.items_fetched += items.len();
        self.pages_fetched += 1;

        let more = match &mut self.cursor {
            // Bare lists carry no metadata, but an object body that reports
            // `total_pages` is trusted whatever the dialect
            Cursor::Page(page) => total_pages(body).map_or(true, |total| *page < total),
            Cursor::Offset(offset) => {
                *offset = next_offset(body);
                offset.is_some()
            }
        };
        let capped = self.limits.max_items.is_some_and(|max| self.items_fetched >= max)
            || self.limits.max_pages.is_some_and(|max| self.pages_fetched >= max);
        if !more || capped {
            debug!(
                items_fetched = self.items_fetched,
                pages_fetched = self.pages_fetched,
                capped,
                "Pagination finished"
            );
            self.done = true;
        }
        Some(items)
    }
}
