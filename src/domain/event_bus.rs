//! Broadcast channel for newly stored notifications.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every delivered
//! notification is published here and WebSocket connections subscribe to
//! forward the ones addressed to their user.

use tokio::sync::broadcast;

use super::Notification;

/// Broadcast bus for [`Notification`]s.
///
/// When the ring buffer is full, the oldest notifications are dropped for
/// lagging receivers, which are expected to resync from the store.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notification to all subscribers.
    ///
    /// Returns the number of receivers that received it. With no active
    /// receivers the notification is silently dropped.
    pub fn publish(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    /// Creates a new receiver for all future notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{NotificationKind, UserId};
    use chrono::Utc;

    fn make_notification(id: i64) -> Notification {
        Notification {
            id,
            user_id: UserId::new(),
            kind: NotificationKind::System,
            title: "hello".to_string(),
            message: "world".to_string(),
            lead_id: None,
            is_read: false,
            created_at: Utc::now(),
            action_url: None,
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(make_notification(1)), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_notification() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(make_notification(9));

        let Ok(received) = rx.recv().await else {
            panic!("expected to receive notification");
        };
        assert_eq!(received.id, 9);
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(16);
        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
