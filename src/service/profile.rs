//! User profiles, created blank on first read.

use chrono::Utc;

use crate::domain::{AuthUser, ProfileUpdate, UserProfile, validate_avatar_url};
use crate::error::LeadSwipeError;
use crate::store::Store;

/// Reads and writes [`UserProfile`]s.
#[derive(Debug, Clone)]
pub struct ProfileService {
    store: Store,
}

impl ProfileService {
    /// Creates a new `ProfileService`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Stored profile, inserting a blank one for a user without a row.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn get(&self, user: &AuthUser) -> Result<UserProfile, LeadSwipeError> {
        if let Some(profile) = self.store.profiles.profile_for(user.id).await? {
            return Ok(profile);
        }
        let profile = self
            .store
            .profiles
            .upsert_profile(&UserProfile::blank_for(user))
            .await?;
        tracing::debug!(user_id = %user.id, "blank profile created");
        Ok(profile)
    }

    /// Applies `update`. Names are trimmed and a blank name clears it.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::InvalidRequest`] for an avatar that is not
    /// an image URL or is too large, and [`LeadSwipeError::Store`] on store
    /// failure.
    pub async fn update(
        &self,
        user: &AuthUser,
        update: ProfileUpdate,
    ) -> Result<UserProfile, LeadSwipeError> {
        if let Some(Some(url)) = &update.avatar_url {
            validate_avatar_url(url).map_err(LeadSwipeError::InvalidRequest)?;
        }

        let mut profile = self.get(user).await?;
        if let Some(name) = update.full_name {
            profile.full_name = name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
        }
        if let Some(url) = update.avatar_url {
            profile.avatar_url = url;
        }
        profile.email.clone_from(&user.email);
        profile.updated_at = Utc::now();

        let stored = self.store.profiles.upsert_profile(&profile).await?;
        tracing::info!(user_id = %user.id, "profile updated");
        Ok(stored)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::UserId;
    use crate::store::{InMemoryStore, ProfileRepository, StoreError, StoreOp};

    fn user() -> AuthUser {
        AuthUser {
            id: UserId::new(),
            email: "dana@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn first_read_creates_blank_profile() {
        let store = Arc::new(InMemoryStore::new());
        let service = ProfileService::new(Store::from_adapter(Arc::clone(&store)));
        let user = user();

        let Ok(profile) = service.get(&user).await else {
            panic!("expected profile");
        };
        assert_eq!(profile.email, "dana@example.com");
        assert_eq!(profile.full_name, None);
        assert!(matches!(store.profile_for(user.id).await, Ok(Some(_))));
    }

    #[tokio::test]
    async fn update_sets_and_clears_fields() {
        let service = ProfileService::new(Store::from_adapter(Arc::new(InMemoryStore::new())));
        let user = user();

        let set = ProfileUpdate {
            full_name: Some(Some("  Dana Scully ".to_string())),
            avatar_url: Some(Some("https://cdn.example.com/d.png".to_string())),
        };
        let Ok(profile) = service.update(&user, set).await else {
            panic!("expected update");
        };
        assert_eq!(profile.full_name.as_deref(), Some("Dana Scully"));

        // Absent fields stay; an explicit null clears.
        let clear_avatar = ProfileUpdate {
            full_name: None,
            avatar_url: Some(None),
        };
        let Ok(profile) = service.update(&user, clear_avatar).await else {
            panic!("expected update");
        };
        assert_eq!(profile.full_name.as_deref(), Some("Dana Scully"));
        assert_eq!(profile.avatar_url, None);
    }

    #[tokio::test]
    async fn bad_avatar_is_rejected_before_writing() {
        let store = Arc::new(InMemoryStore::new());
        let service = ProfileService::new(Store::from_adapter(Arc::clone(&store)));
        let user = user();
        let update = ProfileUpdate {
            full_name: None,
            avatar_url: Some(Some("ftp://example.com/a.png".to_string())),
        };
        assert!(matches!(
            service.update(&user, update).await,
            Err(LeadSwipeError::InvalidRequest(_))
        ));
        assert!(matches!(store.profile_for(user.id).await, Ok(None)));
    }

    #[tokio::test]
    async fn store_failure_is_returned() {
        let store = Arc::new(InMemoryStore::new());
        store
            .inject_failure(StoreOp::UpsertProfile, StoreError::Connection("down".into()))
            .await;
        let service = ProfileService::new(Store::from_adapter(store));
        assert!(matches!(
            service.get(&user()).await,
            Err(LeadSwipeError::Store(StoreError::Connection(_)))
        ));
    }
}
