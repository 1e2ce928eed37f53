//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::query::Page;
use crate::service::MembershipOutcome;

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Page actually served.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
    /// Rows matching the query before pagination.
    pub total_count: u64,
    /// Total number of pages.
    pub total_pages: u32,
    /// Whether rows exist past this page.
    pub has_more: bool,
}

impl PaginationMeta {
    /// Splits a [`Page`] into its rows and metadata.
    #[must_use]
    pub fn split<T>(page: Page<T>) -> (Vec<T>, Self) {
        let meta = Self {
            page: page.page,
            page_size: page.page_size,
            total_count: page.total_count,
            total_pages: page.total_pages,
            has_more: page.has_more,
        };
        (page.items, meta)
    }
}

/// Result of one or more membership writes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Writes in the order they ran.
    pub outcomes: Vec<MembershipOutcome>,
}
