//! Live lead sessions keyed by session token, one lock per session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::lead_session::LeadSession;
use super::swipe::SwipeThresholds;
use crate::config::FeedConfig;
use crate::domain::{AuthUser, EventBus, SessionToken};
use crate::error::LeadSwipeError;
use crate::service::{GroupService, LeadService, NotificationService, SettingsService};
use crate::store::Store;

/// Services and tuning shared by every session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Store ports.
    pub store: Store,
    /// Lead queries.
    pub leads: LeadService,
    /// Notification delivery.
    pub notifications: NotificationService,
    /// Linked groups.
    pub groups: GroupService,
    /// User settings.
    pub settings: SettingsService,
    /// Feed paging.
    pub feed: FeedConfig,
    /// Swipe gesture thresholds.
    pub swipe: SwipeThresholds,
}

impl SessionContext {
    /// Builds the services over `store`.
    #[must_use]
    pub fn new(store: Store, event_bus: EventBus, feed: FeedConfig, swipe: SwipeThresholds) -> Self {
        Self {
            leads: LeadService::new(store.clone()),
            notifications: NotificationService::new(store.clone(), event_bus),
            groups: GroupService::new(store.clone()),
            settings: SettingsService::new(store.clone()),
            store,
            feed,
            swipe,
        }
    }
}

/// Active [`LeadSession`]s.
///
/// The outer map is behind a `RwLock`; each session sits behind its own
/// `Mutex`, so requests for one session run one at a time while different
/// sessions proceed concurrently.
#[derive(Debug)]
pub struct SessionRegistry {
    ctx: SessionContext,
    sessions: RwLock<HashMap<SessionToken, Arc<Mutex<LeadSession>>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Shared services.
    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Returns the session for `token`, starting one if needed.
    ///
    /// # Errors
    ///
    /// Returns the [`LeadSession::start`] error.
    pub async fn get_or_start(
        &self,
        user: &AuthUser,
        token: &SessionToken,
    ) -> Result<Arc<Mutex<LeadSession>>, LeadSwipeError> {
        if let Some(session) = self.sessions.read().await.get(token) {
            return Ok(Arc::clone(session));
        }

        let started = LeadSession::start(self.ctx.clone(), user.clone(), token.clone()).await?;
        let mut map = self.sessions.write().await;
        // another request may have started it while this one was loading
        let session = map
            .entry(token.clone())
            .or_insert_with(|| Arc::new(Mutex::new(started)));
        Ok(Arc::clone(session))
    }

    /// Returns the session for `token` if one is running.
    pub async fn get(&self, token: &SessionToken) -> Option<Arc<Mutex<LeadSession>>> {
        self.sessions.read().await.get(token).map(Arc::clone)
    }

    /// Drops the session for `token`. Returns `true` if there was one.
    pub async fn remove(&self, token: &SessionToken) -> bool {
        let removed = self.sessions.write().await.remove(token).is_some();
        if removed {
            tracing::debug!("lead session closed");
        }
        removed
    }

    /// Returns the number of running sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is running.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Lead, LeadId};
    use crate::store::InMemoryStore;

    async fn registry() -> (Arc<InMemoryStore>, SessionRegistry) {
        let store = Arc::new(InMemoryStore::new());
        store.insert_lead(Lead::new(LeadId::new(1), "Ada")).await;
        let ctx = SessionContext::new(
            Store::from_adapter(Arc::clone(&store)),
            EventBus::new(8),
            FeedConfig::default(),
            SwipeThresholds::default(),
        );
        (store, SessionRegistry::new(ctx))
    }

    #[tokio::test]
    async fn get_or_start_reuses_session() {
        let (store, registry) = registry().await;
        let user = store.register_user("a@b.io", "pw").await;
        let token = store.issue_session(user.id).await;

        let Ok(first) = registry.get_or_start(&user, &token).await else {
            panic!("expected session");
        };
        let Ok(second) = registry.get_or_start(&user, &token).await else {
            panic!("expected session");
        };
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn sessions_are_per_token() {
        let (store, registry) = registry().await;
        let user = store.register_user("a@b.io", "pw").await;
        let one = store.issue_session(user.id).await;
        let two = store.issue_session(user.id).await;

        assert!(registry.get_or_start(&user, &one).await.is_ok());
        assert!(registry.get_or_start(&user, &two).await.is_ok());
        assert_eq!(registry.len().await, 2);

        assert!(registry.remove(&one).await);
        assert!(!registry.remove(&one).await);
        assert!(registry.get(&one).await.is_none());
        assert!(registry.get(&two).await.is_some());
    }

    #[tokio::test]
    async fn empty_registry() {
        let (_, registry) = registry().await;
        assert!(registry.is_empty().await);
    }
}
