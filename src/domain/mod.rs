//! Domain layer: leads, membership sets, notifications, user records and
//! the event bus.
//!
//! Everything here is plain data plus small pure helpers. Nothing in this
//! module talks to the store.

pub mod event_bus;
pub mod group;
pub mod ids;
pub mod lead;
pub mod membership;
pub mod notification;
pub mod profile;
pub mod settings;

pub use event_bus::EventBus;
pub use group::{FacebookGroup, MAX_GROUPS_PER_USER, NewGroup, extract_group_id};
pub use ids::{AuthUser, LeadId, SessionToken, UserId};
pub use lead::Lead;
pub use membership::{BlockedLead, LeadStats, MembershipKind, MembershipRecord, MembershipSets};
pub use notification::{DeliveryOutcome, NewNotification, Notification, NotificationKind};
pub use profile::{MAX_AVATAR_URL_LEN, ProfileUpdate, UserProfile, validate_avatar_url};
pub use settings::{SessionPreferences, Theme, UserSettings};
