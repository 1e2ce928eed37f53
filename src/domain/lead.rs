//! Lead records as produced by the ingestion pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::LeadId;

/// A prospective contact sourced from Facebook group activity.
///
/// Leads are written by an external ingestion process and are read-only
/// here. Display fields describe the person; provenance fields describe the
/// post or comment the lead was extracted from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    /// Lead identifier.
    pub id: LeadId,

    /// Full display name as scraped.
    #[serde(default)]
    pub name: String,
    /// Given name, when the ingestion split it out.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name, when the ingestion split it out.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Job title or role.
    #[serde(default)]
    pub position: String,
    /// Free-form location.
    #[serde(default)]
    pub location: String,
    /// Short description or bio.
    #[serde(default)]
    pub description: String,
    /// Company size bucket (e.g. `"11-50"`).
    #[serde(default)]
    pub employees: String,
    /// Industry label.
    #[serde(default)]
    pub industry: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Profile picture URL.
    #[serde(default)]
    pub image_url: String,
    /// Company logo URL.
    #[serde(default)]
    pub logo_url: String,
    /// Contact e-mail, if known.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone, if known.
    #[serde(default)]
    pub phone: Option<String>,

    /// Source post id.
    #[serde(default)]
    pub post_id: Option<String>,
    /// Source post text.
    #[serde(default)]
    pub post_text: Option<String>,
    /// Source post author name.
    #[serde(default)]
    pub post_author: Option<String>,
    /// Source post author id.
    #[serde(default)]
    pub post_author_id: Option<String>,
    /// Source comment id.
    #[serde(default)]
    pub comment_id: Option<String>,
    /// Source comment text.
    #[serde(default)]
    pub comment_text: Option<String>,
    /// Source comment author name.
    #[serde(default)]
    pub comment_author_name: Option<String>,
    /// Source comment author id.
    #[serde(default)]
    pub comment_author_id: Option<String>,
    /// Permalink to the source comment.
    #[serde(default)]
    pub comment_url: Option<String>,
    /// Facebook group the lead was found in.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Human-readable group name.
    #[serde(default)]
    pub group_name: Option<String>,
    /// When the source activity happened.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Lead {
    /// Creates a lead with only an id and a name set.
    #[must_use]
    pub fn new(id: LeadId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Name used in notifications and match dialogs: `"first last"` when
    /// both parts are present, otherwise the scraped `name`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{first} {last}")
            }
            _ => self.name.clone(),
        }
    }

    /// Text shown on the card body: comment, then post, then description.
    #[must_use]
    pub fn card_text(&self) -> &str {
        self.comment_text
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.post_text.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.description)
    }

    /// Returns `true` if the lead was sourced from one of `group_ids`.
    #[must_use]
    pub fn in_groups(&self, group_ids: &[String]) -> bool {
        self.group_id
            .as_ref()
            .is_some_and(|g| group_ids.iter().any(|id| id == g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_split_parts() {
        let mut lead = Lead::new(LeadId::new(1), "jane d.");
        lead.first_name = Some("Jane".to_string());
        lead.last_name = Some("Doe".to_string());
        assert_eq!(lead.display_name(), "Jane Doe");
    }

    #[test]
    fn display_name_falls_back_to_name() {
        let mut lead = Lead::new(LeadId::new(1), "Acme Buyer");
        lead.first_name = Some("Acme".to_string());
        assert_eq!(lead.display_name(), "Acme Buyer");
    }

    #[test]
    fn card_text_order() {
        let mut lead = Lead::new(LeadId::new(1), "x");
        lead.description = "bio".to_string();
        assert_eq!(lead.card_text(), "bio");

        lead.post_text = Some("post".to_string());
        assert_eq!(lead.card_text(), "post");

        lead.comment_text = Some("comment".to_string());
        assert_eq!(lead.card_text(), "comment");
    }

    #[test]
    fn group_membership() {
        let mut lead = Lead::new(LeadId::new(1), "x");
        let groups = vec!["g1".to_string(), "g2".to_string()];
        assert!(!lead.in_groups(&groups));

        lead.group_id = Some("g2".to_string());
        assert!(lead.in_groups(&groups));
        assert!(!lead.in_groups(&[]));
    }
}
