//! Service layer: business logic orchestration over the store ports.
//!
//! [`LeadService`] serves paginated lead lists, [`MembershipManager`] keeps a
//! user's membership sets in sync with the store, and
//! [`NotificationService`] stores notifications and publishes them through
//! the [`super::domain::EventBus`].

pub mod groups;
pub mod leads;
pub mod membership;
pub mod notifications;
pub mod profile;
pub mod settings;

pub use groups::GroupService;
pub use leads::{LeadService, ListView};
pub use membership::{MembershipManager, MembershipOutcome};
pub use notifications::{
    DEFAULT_NOTIFICATION_LIMIT, ListenerEvent, NotificationListener, NotificationService,
};
pub use profile::ProfileService;
pub use settings::SettingsService;
