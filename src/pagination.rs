//! Paginated collection listing.
//!
//! A page fetch always asks the remote for the inline total (`$count=true`),
//! pages with `$top`/`$skip` when the page size is limited, and echoes the
//! caller's filter and ordering back in the metadata.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::Client;
use crate::error::Result;
use crate::executor::{decode_value, ApiRequest};
use crate::query::{Filter, OrderBy, QueryDescription};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Raw page-size sentinel meaning "no limit".
pub const UNBOUNDED_PAGE_SIZE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    Limited(u32),
    /// Whole collection in one call; no `$top`/`$skip` is sent.
    Unbounded,
}

impl Default for PageSize {
    fn default() -> Self { PageSize::Limited(DEFAULT_PAGE_SIZE) }
}

impl From<i64> for PageSize {
    /// Positive sizes limit the page; zero and negative sizes (the `-1`
    /// sentinel) mean unbounded.
    fn from(raw: i64) -> Self {
        if raw > 0 {
            PageSize::Limited(u32::try_from(raw).unwrap_or(u32::MAX))
        } else {
            PageSize::Unbounded
        }
    }
}

impl From<u32> for PageSize {
    fn from(raw: u32) -> Self {
        if raw == 0 { PageSize::Unbounded } else { PageSize::Limited(raw) }
    }
}

/// 1-based page number plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: PageSize,
}

impl Default for PageRequest {
    fn default() -> Self { Self { page: 1, size: PageSize::default() } }
}

impl PageRequest {
    pub fn new(page: u32, size: impl Into<PageSize>) -> Self {
        Self { page, size: size.into() }
    }

    pub fn all() -> Self { Self { page: 1, size: PageSize::Unbounded } }

    /// Page number clamped to at least 1.
    pub fn page_number(&self) -> u32 { self.page.max(1) }

    /// Force the count and set (or clear) the paging clauses on `q`.
    pub fn apply(&self, q: &mut QueryDescription) {
        q.count = true;
        match self.size {
            PageSize::Limited(n) => {
                let n = u64::from(n);
                q.top = Some(n);
                q.skip = Some(u64::from(self.page_number() - 1) * n);
            }
            PageSize::Unbounded => {
                q.top = None;
                q.skip = None;
            }
        }
    }
}

/// `ceil(count / size)` for a limited size. An unbounded fetch is one page
/// (zero when the collection is empty).
pub fn page_count(count: u64, size: PageSize) -> u64 {
    match size {
        PageSize::Limited(n) => count.div_ceil(u64::from(n)),
        PageSize::Unbounded => u64::from(count > 0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub count: u64,
    pub pages: u64,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<OrderBy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Deserialize)]
struct CollectionEnvelope<T> {
    value: Vec<T>,
    /// Inline total; always requested, so its absence is a contract violation.
    #[serde(rename = "@odata.count")]
    count: u64,
}

impl Client {
    /// Fetch one page of the collection at `path`.
    ///
    /// `meta.filter`/`meta.sort` echo the facets passed in; they are not read
    /// back from the response.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<QueryDescription>,
        page: PageRequest,
    ) -> Result<PaginatedResult<T>> {
        let mut q = query.unwrap_or_default();
        let filter = q.filter.clone();
        let sort = q.order_by.clone();
        page.apply(&mut q);

        let value = self.execute(ApiRequest::get(format!("{}{}", path, q.to_query_string()))).await?;
        let envelope: CollectionEnvelope<T> = decode_value(&value)?;
        let count = envelope.count;
        let meta = PageMeta { count, pages: page_count(count, page.size), page: page.page_number(), filter, sort };
        debug!(target: "tagone", "list {}: rows={} count={} pages={}", path, envelope.value.len(), meta.count, meta.pages);
        Ok(PaginatedResult { data: envelope.value, meta })
    }

    /// Every row of the collection, fetched unpaged in one call.
    pub async fn get_all<T: DeserializeOwned>(&self, path: &str, query: Option<QueryDescription>) -> Result<Vec<T>> {
        Ok(self.list(path, query, PageRequest::all()).await?.data)
    }
}
