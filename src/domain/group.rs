//! Facebook groups a user links to scope their group feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Maximum number of linked groups per user.
pub const MAX_GROUPS_PER_USER: usize = 10;

/// A linked Facebook group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FacebookGroup {
    /// Row id.
    pub id: i64,
    /// Owning user.
    pub user_id: UserId,
    /// Facebook's group id (matches `Lead::group_id`).
    pub group_id: String,
    /// Display name.
    pub group_name: String,
    /// Group URL.
    pub group_url: String,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
}

/// Fields required to link a group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewGroup {
    /// Facebook's group id.
    pub group_id: String,
    /// Display name.
    pub group_name: String,
    /// Group URL.
    pub group_url: String,
}

const GROUP_PATH: &str = "facebook.com/groups/";

/// Extracts the group id from a Facebook group URL.
///
/// Accepts `www.`, `m.` and bare hosts, with or without a scheme, trailing
/// slash or query string. Returns `None` if the URL is not a group link.
#[must_use]
pub fn extract_group_id(url: &str) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    let start = lower.find(GROUP_PATH)? + GROUP_PATH.len();
    let rest = url.get(start..)?;
    let id: String = rest.chars().take_while(|c| *c != '/' && *c != '?').collect();
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_numeric_group_id() {
        assert_eq!(
            extract_group_id("https://www.facebook.com/groups/123456789/"),
            Some("123456789".to_string())
        );
        assert_eq!(
            extract_group_id("https://m.facebook.com/groups/123456789"),
            Some("123456789".to_string())
        );
    }

    #[test]
    fn extracts_vanity_slug_and_stops_at_query() {
        assert_eq!(
            extract_group_id("facebook.com/groups/RustSellers?ref=share"),
            Some("RustSellers".to_string())
        );
    }

    #[test]
    fn host_match_is_case_insensitive() {
        assert_eq!(
            extract_group_id("https://Facebook.COM/groups/abc"),
            Some("abc".to_string())
        );
    }

    #[test]
    fn rejects_non_group_urls() {
        assert_eq!(extract_group_id("https://facebook.com/pages/abc"), None);
        assert_eq!(extract_group_id("https://facebook.com/groups/"), None);
        assert_eq!(extract_group_id(""), None);
    }
}
