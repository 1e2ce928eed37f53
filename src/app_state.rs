//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::LeadSwipeConfig;
use crate::domain::EventBus;
use crate::service::{
    GroupService, LeadService, NotificationService, ProfileService, SettingsService,
};
use crate::session::{SessionContext, SessionRegistry};
use crate::store::Store;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Store ports, for auth.
    pub store: Store,
    /// Lead lists and stats.
    pub leads: LeadService,
    /// Notification reads and writes.
    pub notifications: NotificationService,
    /// Linked groups.
    pub groups: GroupService,
    /// User settings.
    pub settings: SettingsService,
    /// User profiles.
    pub profiles: ProfileService,
    /// Live swipe sessions.
    pub sessions: Arc<SessionRegistry>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires the services over `store`.
    #[must_use]
    pub fn new(store: Store, config: &LeadSwipeConfig) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let ctx = SessionContext::new(store.clone(), event_bus.clone(), config.feed, config.swipe);
        let profiles = ProfileService::new(store.clone());
        Self {
            store,
            leads: ctx.leads.clone(),
            notifications: ctx.notifications.clone(),
            groups: ctx.groups.clone(),
            settings: ctx.settings.clone(),
            profiles,
            sessions: Arc::new(SessionRegistry::new(ctx)),
            event_bus,
        }
    }
}
