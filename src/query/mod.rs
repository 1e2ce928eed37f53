//! Table/list query layer: pagination, filters and client-side sorting.
//!
//! The store evaluates `search` and `group_id` predicates and counts rows
//! before pagination. Keywords and sorting run over the fetched page.

pub mod filter;
pub mod pagination;
pub mod sort;

pub use filter::{LeadFilter, SEARCH_FIELDS, apply_keywords, matches_keywords, matches_search};
pub use pagination::{MAX_PAGE_SIZE, Page, PageRequest};
pub use sort::{SortDirection, SortField, SortSpec, sort_leads};
