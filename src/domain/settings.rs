//! Stored user settings and the per-session preference state derived from
//! them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// UI colour scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Light scheme (default).
    #[default]
    Light,
    /// Dark scheme.
    Dark,
    /// Follow the operating system.
    System,
}

impl Theme {
    /// Storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// A user's stored settings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSettings {
    /// Owning user.
    pub user_id: UserId,
    /// Keywords the lead lists filter on.
    pub keywords: Vec<String>,
    /// E-mail notifications enabled.
    pub notification_email: bool,
    /// Push notifications enabled.
    pub notification_push: bool,
    /// Preferred theme.
    pub theme: Theme,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    /// Settings created on first read for a user without a row.
    #[must_use]
    pub fn defaults_for(user_id: UserId) -> Self {
        Self {
            user_id,
            keywords: Vec::new(),
            notification_email: true,
            notification_push: true,
            theme: Theme::Light,
            updated_at: Utc::now(),
        }
    }
}

/// Preference state scoped to one user session.
///
/// The theme override flag lives here rather than in any process-wide
/// static so two sessions never see each other's choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionPreferences {
    /// Theme currently in effect.
    pub theme: Theme,
    /// `true` once the user picked a theme by hand in this session; stored
    /// settings no longer overwrite it.
    pub manual_override: bool,
    /// Keywords applied to list views.
    pub keywords: Vec<String>,
}

impl SessionPreferences {
    /// Seeds preferences from stored settings.
    #[must_use]
    pub fn from_settings(settings: &UserSettings) -> Self {
        Self {
            theme: settings.theme,
            manual_override: false,
            keywords: settings.keywords.clone(),
        }
    }

    /// Applies a freshly loaded settings row, keeping a manual theme choice.
    pub fn sync(&mut self, settings: &UserSettings) {
        if !self.manual_override {
            self.theme = settings.theme;
        }
        self.keywords.clone_from(&settings.keywords);
    }

    /// Records a theme picked by the user.
    pub fn choose_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.manual_override = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run() {
        let s = UserSettings::defaults_for(UserId::new());
        assert!(s.keywords.is_empty());
        assert!(s.notification_email);
        assert!(s.notification_push);
        assert_eq!(s.theme, Theme::Light);
    }

    #[test]
    fn manual_theme_survives_sync() {
        let mut stored = UserSettings::defaults_for(UserId::new());
        let mut prefs = SessionPreferences::from_settings(&stored);

        prefs.choose_theme(Theme::Dark);
        stored.keywords = vec!["roofing".to_string()];
        prefs.sync(&stored);

        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.keywords, vec!["roofing".to_string()]);
    }

    #[test]
    fn sync_without_override_follows_store() {
        let mut stored = UserSettings::defaults_for(UserId::new());
        let mut prefs = SessionPreferences::from_settings(&stored);
        stored.theme = Theme::System;
        prefs.sync(&stored);
        assert_eq!(prefs.theme, Theme::System);
    }

    #[test]
    fn theme_parse() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert!("neon".parse::<Theme>().is_err());
    }
}
