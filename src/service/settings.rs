//! User settings, created with defaults on first read.

use chrono::Utc;

use crate::domain::{Theme, UserId, UserSettings};
use crate::error::LeadSwipeError;
use crate::store::Store;

/// Reads and writes [`UserSettings`].
#[derive(Debug, Clone)]
pub struct SettingsService {
    store: Store,
}

impl SettingsService {
    /// Creates a new `SettingsService`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Stored settings, inserting defaults for a user without a row.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn get(&self, user_id: UserId) -> Result<UserSettings, LeadSwipeError> {
        if let Some(settings) = self.store.settings.settings_for(user_id).await? {
            return Ok(settings);
        }
        let settings = UserSettings::defaults_for(user_id);
        self.store.settings.upsert_settings(&settings).await?;
        tracing::debug!(%user_id, "default settings created");
        Ok(settings)
    }

    /// Replaces the keyword filter. Blank and duplicate keywords are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn update_keywords(
        &self,
        user_id: UserId,
        keywords: Vec<String>,
    ) -> Result<UserSettings, LeadSwipeError> {
        let mut cleaned: Vec<String> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let keyword = keyword.trim();
            if !keyword.is_empty() && !cleaned.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
                cleaned.push(keyword.to_string());
            }
        }
        self.update(user_id, |s| s.keywords = cleaned).await
    }

    /// Sets the stored theme.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn update_theme(&self, user_id: UserId, theme: Theme) -> Result<UserSettings, LeadSwipeError> {
        self.update(user_id, |s| s.theme = theme).await
    }

    /// Sets the notification channel flags.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn update_notifications(
        &self,
        user_id: UserId,
        email: bool,
        push: bool,
    ) -> Result<UserSettings, LeadSwipeError> {
        self.update(user_id, |s| {
            s.notification_email = email;
            s.notification_push = push;
        })
        .await
    }

    async fn update(
        &self,
        user_id: UserId,
        apply: impl FnOnce(&mut UserSettings),
    ) -> Result<UserSettings, LeadSwipeError> {
        let mut settings = self.get(user_id).await?;
        apply(&mut settings);
        settings.updated_at = Utc::now();
        self.store.settings.upsert_settings(&settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{InMemoryStore, SettingsRepository};

    #[tokio::test]
    async fn first_read_persists_defaults() {
        let store = Arc::new(InMemoryStore::new());
        let service = SettingsService::new(Store::from_adapter(Arc::clone(&store)));
        let user = UserId::new();

        let Ok(settings) = service.get(user).await else {
            panic!("expected settings");
        };
        assert_eq!(settings.theme, Theme::Light);
        assert!(matches!(store.settings_for(user).await, Ok(Some(_))));
    }

    #[tokio::test]
    async fn keywords_are_cleaned() {
        let service = SettingsService::new(Store::from_adapter(Arc::new(InMemoryStore::new())));
        let user = UserId::new();
        let Ok(settings) = service
            .update_keywords(
                user,
                vec![" HVAC ".into(), "hvac".into(), String::new(), "roof".into()],
            )
            .await
        else {
            panic!("expected update");
        };
        assert_eq!(settings.keywords, vec!["HVAC".to_string(), "roof".to_string()]);
    }

    #[tokio::test]
    async fn theme_update_round_trips() {
        let service = SettingsService::new(Store::from_adapter(Arc::new(InMemoryStore::new())));
        let user = UserId::new();
        let Ok(_) = service.update_theme(user, Theme::Dark).await else {
            panic!("expected update");
        };
        let Ok(settings) = service.get(user).await else {
            panic!("expected settings");
        };
        assert_eq!(settings.theme, Theme::Dark);
    }
}
