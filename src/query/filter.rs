//! Free-text search and keyword filters over leads.
//!
//! Search is pushed down to the store and therefore affects `total_count`.
//! Keywords are matched against the already-fetched page only and never
//! change `total_count`, so a keyword-filtered page can hold fewer rows than
//! the page size.

use serde::{Deserialize, Serialize};

use crate::domain::Lead;

/// Filters accepted by the list views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFilter {
    /// Case-insensitive substring matched against [`SEARCH_FIELDS`].
    pub search: Option<String>,
    /// Exact `group_id` match.
    pub group_id: Option<String>,
    /// Case-insensitive keywords; a lead passes if any keyword occurs in its
    /// search columns, `industry` or tags.
    pub keywords: Vec<String>,
}

impl LeadFilter {
    /// Trimmed search term, `None` when absent or blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Non-blank keywords, trimmed.
    #[must_use]
    pub fn active_keywords(&self) -> Vec<&str> {
        self.keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// Columns the free-text search is OR-matched against.
pub const SEARCH_FIELDS: [&str; 7] = [
    "name",
    "first_name",
    "last_name",
    "email",
    "description",
    "post_text",
    "comment_text",
];

fn search_values(lead: &Lead) -> [Option<&str>; 7] {
    [
        Some(lead.name.as_str()),
        lead.first_name.as_deref(),
        lead.last_name.as_deref(),
        lead.email.as_deref(),
        Some(lead.description.as_str()),
        lead.post_text.as_deref(),
        lead.comment_text.as_deref(),
    ]
}

/// Returns `true` if any search column contains `term`, ignoring case.
///
/// Mirrors the `ILIKE '%term%'` predicate the PostgreSQL adapter issues.
#[must_use]
pub fn matches_search(lead: &Lead, term: &str) -> bool {
    let needle = term.to_lowercase();
    search_values(lead)
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
}

fn keyword_haystack(lead: &Lead) -> String {
    let fields = [
        Some(lead.name.as_str()),
        lead.first_name.as_deref(),
        lead.last_name.as_deref(),
        lead.email.as_deref(),
        lead.comment_text.as_deref(),
        lead.post_text.as_deref(),
        Some(lead.description.as_str()),
        Some(lead.industry.as_str()),
    ];
    fields
        .into_iter()
        .flatten()
        .chain(lead.tags.iter().map(String::as_str))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns `true` if `keywords` is empty or any keyword occurs in the lead.
#[must_use]
pub fn matches_keywords(lead: &Lead, keywords: &[&str]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = keyword_haystack(lead);
    keywords
        .iter()
        .any(|k| haystack.contains(&k.to_lowercase()))
}

/// Drops leads that match none of `keywords`.
#[must_use]
pub fn apply_keywords(leads: Vec<Lead>, keywords: &[&str]) -> Vec<Lead> {
    if keywords.is_empty() {
        return leads;
    }
    leads
        .into_iter()
        .filter(|lead| matches_keywords(lead, keywords))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LeadId;

    fn lead(id: i64, name: &str) -> Lead {
        Lead::new(LeadId::new(id), name)
    }

    #[test]
    fn search_is_case_insensitive_over_fixed_fields() {
        let mut l = lead(1, "Jane");
        l.comment_text = Some("Looking for an ACME supplier".to_string());
        assert!(matches_search(&l, "acme"));

        l.comment_text = None;
        l.industry = "acme".to_string();
        // industry is not a search column
        assert!(!matches_search(&l, "acme"));
    }

    #[test]
    fn keywords_include_tags_and_industry() {
        let mut l = lead(1, "Jane");
        l.tags = vec!["Solar".to_string()];
        assert!(matches_keywords(&l, &["solar"]));

        let mut m = lead(2, "Bob");
        m.industry = "Roofing".to_string();
        assert!(matches_keywords(&m, &["paint", "roof"]));
        assert!(!matches_keywords(&m, &["paint"]));
    }

    #[test]
    fn empty_keywords_keep_everything() {
        let leads = vec![lead(1, "a"), lead(2, "b")];
        assert_eq!(apply_keywords(leads.clone(), &[]), leads);
    }

    #[test]
    fn keyword_filter_never_grows_the_page() {
        let mut leads: Vec<Lead> = (1..=10).map(|i| lead(i, "x")).collect();
        if let Some(first) = leads.first_mut() {
            first.description = "hvac installer".to_string();
        }
        let before = leads.len();
        let after = apply_keywords(leads, &["hvac"]);
        assert!(after.len() <= before);
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn blank_terms_are_ignored() {
        let filter = LeadFilter {
            search: Some("   ".to_string()),
            group_id: None,
            keywords: vec![" ".to_string(), " hvac ".to_string()],
        };
        assert_eq!(filter.search_term(), None);
        assert_eq!(filter.active_keywords(), vec!["hvac"]);
    }
}
