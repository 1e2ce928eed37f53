//! Lead list DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::Lead;
use crate::query::{LeadFilter, PageRequest, SortDirection, SortField, SortSpec};
use crate::service::ListView;

/// Query parameters for `GET /leads`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Which membership view to list. Defaults to every lead.
    #[serde(default)]
    pub view: ListView,
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Rows per page (max 100).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Case-insensitive substring search.
    #[serde(default)]
    pub search: Option<String>,
    /// Restrict to one Facebook group.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Comma-separated keywords; a row must contain at least one.
    #[serde(default)]
    pub keywords: Option<String>,
    /// Column to sort the page by.
    #[serde(default)]
    pub sort: Option<SortField>,
    /// Sort direction.
    #[serde(default)]
    pub direction: SortDirection,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

impl ListParams {
    /// Requested page.
    #[must_use]
    pub const fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }

    /// Search, group and keyword filter.
    #[must_use]
    pub fn filter(&self) -> LeadFilter {
        LeadFilter {
            search: self.search.clone(),
            group_id: self.group_id.clone(),
            keywords: self
                .keywords
                .as_deref()
                .map(|k| {
                    k.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Sort order, if a column was given.
    #[must_use]
    pub fn sort(&self) -> Option<SortSpec> {
        self.sort.map(|field| SortSpec::new(field, self.direction))
    }
}

/// Response body for `GET /leads`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeadListResponse {
    /// Rows on this page.
    pub data: Vec<Lead>,
    /// Page metadata.
    pub pagination: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_split_on_commas() {
        let params = ListParams {
            keywords: Some(" roof, ,hvac ".to_string()),
            ..ListParams::default()
        };
        assert_eq!(params.filter().keywords, vec!["roof".to_string(), "hvac".to_string()]);
    }

    #[test]
    fn sort_needs_a_field() {
        let params = ListParams {
            direction: SortDirection::Desc,
            ..ListParams::default()
        };
        assert!(params.sort().is_none());

        let params = ListParams {
            sort: Some(SortField::Name),
            direction: SortDirection::Desc,
            ..ListParams::default()
        };
        assert_eq!(
            params.sort(),
            Some(SortSpec::new(SortField::Name, SortDirection::Desc))
        );
    }
}
