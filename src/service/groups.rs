//! Linked Facebook groups.

use crate::domain::{FacebookGroup, MAX_GROUPS_PER_USER, NewGroup, UserId, extract_group_id};
use crate::error::LeadSwipeError;
use crate::store::Store;

/// Manages the groups a user links to scope their group feed.
#[derive(Debug, Clone)]
pub struct GroupService {
    store: Store,
}

impl GroupService {
    /// Creates a new `GroupService`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The user's groups, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<FacebookGroup>, LeadSwipeError> {
        Ok(self.store.groups.groups_for(user_id).await?)
    }

    /// Facebook group ids the user linked.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn group_ids(&self, user_id: UserId) -> Result<Vec<String>, LeadSwipeError> {
        Ok(self
            .list(user_id)
            .await?
            .into_iter()
            .map(|g| g.group_id)
            .collect())
    }

    /// Links a group.
    ///
    /// A blank `group_id` is taken from `group_url`.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::InvalidRequest`] if no group id can be
    /// determined or the name is blank,
    /// [`LeadSwipeError::GroupLimitReached`] past the per-user limit, and
    /// [`LeadSwipeError::Store`] with a conflict for a duplicate.
    pub async fn add(&self, user_id: UserId, group: NewGroup) -> Result<FacebookGroup, LeadSwipeError> {
        let group_id = match group.group_id.trim() {
            "" => extract_group_id(&group.group_url).ok_or_else(|| {
                LeadSwipeError::InvalidRequest(format!(
                    "not a Facebook group URL: {}",
                    group.group_url
                ))
            })?,
            id => id.to_string(),
        };
        let group_name = group.group_name.trim().to_string();
        if group_name.is_empty() {
            return Err(LeadSwipeError::InvalidRequest(
                "group_name must not be empty".to_string(),
            ));
        }

        let group = NewGroup {
            group_id,
            group_name,
            group_url: group.group_url.trim().to_string(),
        };
        let stored = self
            .store
            .groups
            .insert_group(user_id, &group, MAX_GROUPS_PER_USER)
            .await?
            .ok_or(LeadSwipeError::GroupLimitReached {
                limit: MAX_GROUPS_PER_USER,
            })?;
        tracing::info!(%user_id, group_id = %stored.group_id, "group linked");
        Ok(stored)
    }

    /// Unlinks a group by row id.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::GroupNotFound`] if the user has no such
    /// group.
    pub async fn remove(&self, user_id: UserId, id: i64) -> Result<(), LeadSwipeError> {
        if self.store.groups.delete_group(user_id, id).await? {
            tracing::info!(%user_id, id, "group unlinked");
            Ok(())
        } else {
            Err(LeadSwipeError::GroupNotFound(id))
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{InMemoryStore, StoreError};

    fn service() -> GroupService {
        GroupService::new(Store::from_adapter(Arc::new(InMemoryStore::new())))
    }

    fn group(id: &str) -> NewGroup {
        NewGroup {
            group_id: id.to_string(),
            group_name: format!("group {id}"),
            group_url: format!("https://facebook.com/groups/{id}"),
        }
    }

    #[tokio::test]
    async fn limit_is_enforced() {
        let service = service();
        let user = UserId::new();
        for i in 0..MAX_GROUPS_PER_USER {
            let Ok(_) = service.add(user, group(&i.to_string())).await else {
                panic!("expected group {i} to be linked");
            };
        }
        assert!(matches!(
            service.add(user, group("overflow")).await,
            Err(LeadSwipeError::GroupLimitReached { limit: 10 })
        ));
    }

    #[tokio::test]
    async fn concurrent_adds_respect_limit() {
        let service = service();
        let user = UserId::new();
        let adds = (0..MAX_GROUPS_PER_USER + 5).map(|i| {
            let service = service.clone();
            async move { service.add(user, group(&format!("c{i}"))).await }
        });
        let results = futures_util::future::join_all(adds).await;

        let linked = results.iter().filter(|r| r.is_ok()).count();
        let refused = results
            .iter()
            .filter(|r| matches!(r, Err(LeadSwipeError::GroupLimitReached { .. })))
            .count();
        assert_eq!(linked, MAX_GROUPS_PER_USER);
        assert_eq!(refused, 5);
        assert_eq!(service.list(user).await.map(|g| g.len()).ok(), Some(MAX_GROUPS_PER_USER));
    }

    #[tokio::test]
    async fn duplicate_is_conflict() {
        let service = service();
        let user = UserId::new();
        assert!(service.add(user, group("1")).await.is_ok());
        assert!(matches!(
            service.add(user, group("1")).await,
            Err(LeadSwipeError::Store(StoreError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn id_is_extracted_from_url() {
        let service = service();
        let user = UserId::new();
        let new = NewGroup {
            group_id: String::new(),
            group_name: "Roofers".to_string(),
            group_url: "https://www.facebook.com/groups/roofers/?ref=bookmarks".to_string(),
        };
        let Ok(stored) = service.add(user, new).await else {
            panic!("expected group to be linked");
        };
        assert_eq!(stored.group_id, "roofers");
        assert_eq!(service.group_ids(user).await.ok(), Some(vec!["roofers".to_string()]));
    }

    #[tokio::test]
    async fn bad_url_is_rejected() {
        let service = service();
        let new = NewGroup {
            group_id: String::new(),
            group_name: "x".to_string(),
            group_url: "https://example.com".to_string(),
        };
        assert!(matches!(
            service.add(UserId::new(), new).await,
            Err(LeadSwipeError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn remove_unknown_group() {
        let service = service();
        assert!(matches!(
            service.remove(UserId::new(), 7).await,
            Err(LeadSwipeError::GroupNotFound(7))
        ));
    }
}
