//! Page requests, page results and the out-of-range clamp.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Largest page size a caller may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageRequest {
    /// Page number (1-indexed).
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
}

impl PageRequest {
    /// Creates a request. Use [`PageRequest::clamped`] before querying.
    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Forces `page >= 1` and `1 <= page_size <= MAX_PAGE_SIZE`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the requested page, ignoring the total.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Row offset to actually query given `total` matching rows.
    ///
    /// A request past the end is moved to the start of the last page so the
    /// caller never receives an empty page while rows exist.
    #[must_use]
    pub fn resolve_offset(self, total: u64) -> u64 {
        let offset = self.offset();
        if total == 0 || offset < total {
            return offset;
        }
        let size = u64::from(self.page_size.max(1));
        let last_page = total.div_ceil(size).max(1);
        (last_page - 1) * size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Rows on this page (after any client-side keyword filtering).
    pub items: Vec<T>,
    /// Rows matching the query predicate before pagination.
    pub total_count: u64,
    /// Page actually served (differs from the request after clamping).
    pub page: u32,
    /// Page size used.
    pub page_size: u32,
    /// Number of pages for `total_count`.
    pub total_pages: u32,
    /// Whether rows exist past this page.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// An empty page for `request`.
    #[must_use]
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page: request.page,
            page_size: request.page_size,
            total_pages: 0,
            has_more: false,
        }
    }

    /// Builds page metadata for `items` fetched at `offset` out of `total`.
    #[must_use]
    pub fn from_offset(items: Vec<T>, offset: u64, page_size: u32, total: u64) -> Self {
        let size = u64::from(page_size.max(1));
        let page = u32::try_from(offset / size + 1).unwrap_or(u32::MAX);
        let total_pages = u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX);
        Self {
            items,
            total_count: total,
            page,
            page_size,
            total_pages,
            has_more: offset + size < total,
        }
    }

    /// Applies `f` to every item, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            has_more: self.has_more,
        }
    }
}
