//! Public profile shown next to the user's name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuthUser, UserId};

/// Largest avatar accepted, measured on the stored URL. Fits a 5 MiB image
/// as a base64 `data:` URL.
pub const MAX_AVATAR_URL_LEN: usize = 7 * 1024 * 1024;

/// A user's profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    /// Owning user.
    pub user_id: UserId,
    /// Sign-in e-mail, copied from the account.
    pub email: String,
    /// Name shown in the navigation bar.
    pub full_name: Option<String>,
    /// `http(s)` URL or `data:image/...` URL.
    pub avatar_url: Option<String>,
    /// First write time.
    pub created_at: DateTime<Utc>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Empty profile for a user who has never saved one.
    #[must_use]
    pub fn blank_for(user: &AuthUser) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id,
            email: user.email.clone(),
            full_name: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update. The outer `None` leaves a field alone; `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New display name.
    pub full_name: Option<Option<String>>,
    /// New avatar.
    pub avatar_url: Option<Option<String>>,
}

/// Checks that `url` is something a browser can render as an avatar.
///
/// # Errors
///
/// Returns a message naming the problem.
pub fn validate_avatar_url(url: &str) -> Result<(), String> {
    if url.len() > MAX_AVATAR_URL_LEN {
        return Err("avatar must be smaller than 5 MB".to_string());
    }
    let lower = url.get(..11).unwrap_or(url).to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:image/")
    {
        Ok(())
    } else {
        Err("avatar_url must be an http(s) or data:image URL".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_urls() {
        assert!(validate_avatar_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_avatar_url("data:image/png;base64,iVBORw0").is_ok());
        assert!(validate_avatar_url("HTTPS://EXAMPLE.COM/A.PNG").is_ok());
        assert!(validate_avatar_url("javascript:alert(1)").is_err());
        assert!(validate_avatar_url("data:text/html,hi").is_err());
        assert!(validate_avatar_url(&format!("data:image/png;base64,{}", "A".repeat(MAX_AVATAR_URL_LEN))).is_err());
    }
}
