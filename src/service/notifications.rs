//! Notification CRUD, best-effort enqueue and per-user live listener.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use utoipa::ToSchema;

use crate::domain::{AuthUser, DeliveryOutcome, EventBus, NewNotification, Notification, UserId};
use crate::error::LeadSwipeError;
use crate::store::{NotificationRepository, Store, StoreError};

/// Default number of notifications returned by [`NotificationService::list`].
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 50;

/// Stores notifications and publishes delivered ones on the [`EventBus`].
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Store,
    event_bus: EventBus,
}

impl NotificationService {
    /// Creates a new `NotificationService`.
    #[must_use]
    pub fn new(store: Store, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Enqueues `notification` on behalf of `actor`. Never fails.
    ///
    /// Only the recipient may create their own notifications. A permission
    /// rejection from the store is reported as
    /// [`DeliveryOutcome::Deferred`] so the caller can retry later; every
    /// other failure is [`DeliveryOutcome::Dropped`].
    pub async fn create(&self, actor: &AuthUser, notification: NewNotification) -> DeliveryOutcome {
        if actor.id != notification.user_id {
            tracing::warn!(
                actor = %actor.id,
                recipient = %notification.user_id,
                "notification for another user dropped"
            );
            return DeliveryOutcome::Dropped {
                reason: "recipient is not the authenticated user".to_string(),
            };
        }

        match self.store.notifications.insert_notification(&notification).await {
            Ok(stored) => {
                let receivers = self.event_bus.publish(stored.clone());
                tracing::debug!(id = stored.id, receivers, "notification delivered");
                DeliveryOutcome::Delivered {
                    notification: stored,
                }
            }
            Err(StoreError::PermissionDenied(reason)) => {
                tracing::warn!(user_id = %notification.user_id, %reason, "notification deferred");
                DeliveryOutcome::Deferred {
                    notification,
                    reason,
                }
            }
            Err(err) => {
                tracing::warn!(user_id = %notification.user_id, error = %err, "notification dropped");
                DeliveryOutcome::Dropped {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// The user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn list(&self, user_id: UserId, limit: u32) -> Result<Vec<Notification>, LeadSwipeError> {
        Ok(self
            .store
            .notifications
            .notifications_for(user_id, limit.max(1))
            .await?)
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn unread_count(&self, user_id: UserId) -> Result<u64, LeadSwipeError> {
        Ok(self.store.notifications.count_unread(user_id).await?)
    }

    /// Marks one notification read.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::NotificationNotFound`] if the user has no
    /// such notification.
    pub async fn mark_read(&self, user_id: UserId, id: i64) -> Result<(), LeadSwipeError> {
        if self.store.notifications.mark_read(user_id, id).await? {
            Ok(())
        } else {
            Err(LeadSwipeError::NotificationNotFound(id))
        }
    }

    /// Marks every notification read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, LeadSwipeError> {
        Ok(self.store.notifications.mark_all_read(user_id).await?)
    }

    /// Deletes one notification.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::NotificationNotFound`] if the user has no
    /// such notification.
    pub async fn delete(&self, user_id: UserId, id: i64) -> Result<(), LeadSwipeError> {
        if self.store.notifications.delete_notification(user_id, id).await? {
            Ok(())
        } else {
            Err(LeadSwipeError::NotificationNotFound(id))
        }
    }

    /// Starts a live listener for `user_id`.
    ///
    /// Subscribes before reading the unread count so nothing published in
    /// between is missed.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] if the initial count fails.
    pub async fn listen(&self, user_id: UserId) -> Result<NotificationListener, LeadSwipeError> {
        let receiver = self.event_bus.subscribe();
        let unread = self.unread_count(user_id).await?;
        Ok(NotificationListener {
            user_id,
            receiver,
            unread,
            store: Arc::clone(&self.store.notifications),
        })
    }
}

/// Something a [`NotificationListener`] observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListenerEvent {
    /// A new notification for this user.
    Notification {
        /// The notification.
        notification: Notification,
        /// Unread counter after it arrived.
        unread: u64,
    },
    /// The listener fell behind and reloaded its counter from the store.
    Resynced {
        /// Unread count read back from the store.
        unread: u64,
    },
}

/// Filters bus traffic for one user and tracks an unread counter.
///
/// The counter only grows from live traffic; it is replaced wholesale when
/// the receiver lags.
pub struct NotificationListener {
    user_id: UserId,
    receiver: broadcast::Receiver<Notification>,
    unread: u64,
    store: Arc<dyn NotificationRepository>,
}

impl std::fmt::Debug for NotificationListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationListener")
            .field("user_id", &self.user_id)
            .field("unread", &self.unread)
            .finish_non_exhaustive()
    }
}

impl NotificationListener {
    /// Current unread counter.
    #[must_use]
    pub const fn unread(&self) -> u64 {
        self.unread
    }

    /// Replaces the counter after the user read notifications out of band.
    pub fn set_unread(&mut self, unread: u64) {
        self.unread = unread;
    }

    /// Waits for the next event for this user. Returns `None` once the bus
    /// is closed.
    pub async fn next(&mut self) -> Option<ListenerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) if notification.user_id == self.user_id => {
                    if !notification.is_read {
                        self.unread = self.unread.saturating_add(1);
                    }
                    return Some(ListenerEvent::Notification {
                        notification,
                        unread: self.unread,
                    });
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %self.user_id, skipped, "notification listener lagged");
                    match self.store.count_unread(self.user_id).await {
                        Ok(unread) => {
                            self.unread = unread;
                            return Some(ListenerEvent::Resynced { unread });
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "unread resync failed");
                        }
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::LeadId;
    use crate::store::{InMemoryStore, StoreOp};

    async fn fixture(capacity: usize) -> (Arc<InMemoryStore>, NotificationService, AuthUser) {
        let store = Arc::new(InMemoryStore::new());
        let user = store.register_user("u@x.io", "pw").await;
        let service =
            NotificationService::new(Store::from_adapter(Arc::clone(&store)), EventBus::new(capacity));
        (store, service, user)
    }

    #[tokio::test]
    async fn create_delivers_and_publishes() {
        let (_, service, user) = fixture(16).await;
        let mut rx = service.event_bus().subscribe();

        let outcome = service
            .create(&user, NewNotification::new_match(user.id, LeadId::new(1), "Jane"))
            .await;
        assert!(outcome.is_delivered());

        let Ok(published) = rx.recv().await else {
            panic!("expected published notification");
        };
        assert_eq!(published.title, "New Match!");
        assert_eq!(service.unread_count(user.id).await.ok(), Some(1));
    }

    #[tokio::test]
    async fn permission_denied_defers() {
        let (store, service, user) = fixture(16).await;
        store
            .inject_failure(
                StoreOp::InsertNotification,
                StoreError::PermissionDenied("row-level security".into()),
            )
            .await;

        let new = NewNotification::new_match(user.id, LeadId::new(1), "Jane");
        let outcome = service.create(&user, new.clone()).await;
        let DeliveryOutcome::Deferred { notification, .. } = outcome else {
            panic!("expected deferred outcome");
        };
        assert_eq!(notification, new);
    }

    #[tokio::test]
    async fn other_failures_and_foreign_recipients_drop() {
        let (store, service, user) = fixture(16).await;
        let other = NewNotification::new_match(UserId::new(), LeadId::new(1), "Jane");
        assert!(matches!(
            service.create(&user, other).await,
            DeliveryOutcome::Dropped { .. }
        ));

        store
            .inject_failure(StoreOp::InsertNotification, StoreError::Query("boom".into()))
            .await;
        let mine = NewNotification::new_match(user.id, LeadId::new(1), "Jane");
        assert!(matches!(
            service.create(&user, mine).await,
            DeliveryOutcome::Dropped { .. }
        ));
    }

    #[tokio::test]
    async fn mark_read_and_delete() {
        let (_, service, user) = fixture(16).await;
        let DeliveryOutcome::Delivered { notification } = service
            .create(&user, NewNotification::new_match(user.id, LeadId::new(1), "Jane"))
            .await
        else {
            panic!("expected delivery");
        };

        assert!(service.mark_read(user.id, notification.id).await.is_ok());
        assert_eq!(service.unread_count(user.id).await.ok(), Some(0));
        assert!(matches!(
            service.mark_read(user.id, 999).await,
            Err(LeadSwipeError::NotificationNotFound(999))
        ));

        assert!(service.delete(user.id, notification.id).await.is_ok());
        assert_eq!(service.list(user.id, 10).await.ok().map(|l| l.len()), Some(0));
    }

    #[tokio::test]
    async fn listener_filters_by_user_and_counts() {
        let (store, service, user) = fixture(16).await;
        let other = store.register_user("o@x.io", "pw").await;
        let Ok(mut listener) = service.listen(user.id).await else {
            panic!("expected listener");
        };

        service
            .create(&other, NewNotification::new_match(other.id, LeadId::new(1), "A"))
            .await;
        service
            .create(&user, NewNotification::new_match(user.id, LeadId::new(2), "B"))
            .await;

        let Some(ListenerEvent::Notification { notification, unread }) = listener.next().await
        else {
            panic!("expected notification event");
        };
        assert_eq!(notification.user_id, user.id);
        assert_eq!(unread, 1);
    }

    #[tokio::test]
    async fn lagging_listener_resyncs_from_store() {
        let (_, service, user) = fixture(1).await;
        let Ok(mut listener) = service.listen(user.id).await else {
            panic!("expected listener");
        };

        for id in 1..=3 {
            service
                .create(&user, NewNotification::new_match(user.id, LeadId::new(id), "x"))
                .await;
        }

        let Some(ListenerEvent::Resynced { unread }) = listener.next().await else {
            panic!("expected resync");
        };
        assert_eq!(unread, 3);
        assert_eq!(listener.unread(), 3);
    }
}
