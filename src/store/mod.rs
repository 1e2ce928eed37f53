//! Collaborator ports: the relational store and the auth provider.
//!
//! Each port is an `async_trait` so the services hold `Arc<dyn Port>` and the
//! backing adapter is picked at startup. [`memory::InMemoryStore`] is the
//! default adapter and the one the tests drive; [`postgres::PostgresStore`]
//! talks to PostgreSQL through `sqlx`.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    AuthUser, FacebookGroup, Lead, LeadId, MembershipKind, MembershipRecord, NewGroup,
    NewNotification, Notification, SessionToken, UserId, UserProfile, UserSettings,
};

pub use memory::{InMemoryStore, StoreOp};
pub use postgres::PostgresStore;

/// Errors raised by store and auth adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// A query or mutation failed.
    #[error("store query failed: {0}")]
    Query(String),
    /// A row-level permission policy rejected the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The addressed row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Predicates for a lead count or range fetch.
///
/// Every set field narrows the result. Rows are returned in ascending id
/// order so consecutive pages do not overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadQuery {
    /// Restrict to these ids (membership views). `Some(vec![])` matches
    /// nothing.
    pub include_ids: Option<Vec<LeadId>>,
    /// Drop these ids.
    pub exclude_ids: Vec<LeadId>,
    /// Restrict to leads sourced from any of these groups.
    pub group_ids: Option<Vec<String>>,
    /// Restrict to one group.
    pub group_id: Option<String>,
    /// Case-insensitive substring over the search columns.
    pub search: Option<String>,
}

/// Read access to the leads table.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Counts leads matching `query`.
    async fn count_leads(&self, query: &LeadQuery) -> Result<u64, StoreError>;

    /// Fetches up to `limit` leads matching `query`, skipping `offset`, in
    /// ascending id order.
    async fn fetch_leads(
        &self,
        query: &LeadQuery,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Lead>, StoreError>;

    /// Fetches one lead.
    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, StoreError>;
}

/// The five `(user_id, lead_id)` membership tables.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// All lead ids the user holds in `kind`.
    async fn membership_ids(
        &self,
        user_id: UserId,
        kind: MembershipKind,
    ) -> Result<Vec<LeadId>, StoreError>;

    /// Insert-or-ignore. Returns `true` if a row was created.
    async fn insert_membership(&self, record: &MembershipRecord) -> Result<bool, StoreError>;

    /// Deletes the row. Returns `true` if one existed.
    async fn delete_membership(
        &self,
        user_id: UserId,
        lead_id: LeadId,
        kind: MembershipKind,
    ) -> Result<bool, StoreError>;

    /// Number of rows the user holds in `kind`.
    async fn count_memberships(
        &self,
        user_id: UserId,
        kind: MembershipKind,
    ) -> Result<u64, StoreError>;

    /// Blocked rows with their metadata, newest first.
    async fn blocked_records(&self, user_id: UserId) -> Result<Vec<MembershipRecord>, StoreError>;
}

/// The notifications table.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Stores a notification and returns the stored row.
    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, StoreError>;

    /// The user's notifications, newest first, at most `limit`.
    async fn notifications_for(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, StoreError>;

    /// Number of unread notifications for the user.
    async fn count_unread(&self, user_id: UserId) -> Result<u64, StoreError>;

    /// Marks one notification read. Returns `false` if it does not exist.
    async fn mark_read(&self, user_id: UserId, id: i64) -> Result<bool, StoreError>;

    /// Marks every notification of the user read. Returns the rows changed.
    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, StoreError>;

    /// Deletes one notification. Returns `false` if it does not exist.
    async fn delete_notification(&self, user_id: UserId, id: i64) -> Result<bool, StoreError>;
}

/// The linked Facebook groups table.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// The user's groups, oldest first.
    async fn groups_for(&self, user_id: UserId) -> Result<Vec<FacebookGroup>, StoreError>;

    /// Links a group unless the user already has `limit` of them, in which
    /// case nothing is written and `None` is returned. The count and the
    /// insert are one atomic step. Fails with [`StoreError::Conflict`] on a
    /// duplicate `(user_id, group_id)`.
    async fn insert_group(
        &self,
        user_id: UserId,
        group: &NewGroup,
        limit: usize,
    ) -> Result<Option<FacebookGroup>, StoreError>;

    /// Unlinks a group by row id. Returns `false` if it does not exist.
    async fn delete_group(&self, user_id: UserId, id: i64) -> Result<bool, StoreError>;
}

/// The user settings table.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Stored settings, `None` if the user has no row yet.
    async fn settings_for(&self, user_id: UserId) -> Result<Option<UserSettings>, StoreError>;

    /// Inserts or replaces the row.
    async fn upsert_settings(&self, settings: &UserSettings) -> Result<(), StoreError>;
}

/// The user profiles table.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Stored profile, `None` if the user never saved one.
    async fn profile_for(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Inserts or replaces the row, keeping the original `created_at`.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, StoreError>;
}

/// The authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves a bearer token to its user, `None` if the session is invalid.
    async fn current_user(&self, token: &SessionToken) -> Result<Option<AuthUser>, StoreError>;

    /// Exchanges credentials for a session. `None` on bad credentials.
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<(AuthUser, SessionToken)>, StoreError>;

    /// Ends a session. Unknown tokens are ignored.
    async fn sign_out(&self, token: &SessionToken) -> Result<(), StoreError>;
}

/// Every port, bundled for injection into the services.
#[derive(Clone)]
pub struct Store {
    /// Leads.
    pub leads: Arc<dyn LeadRepository>,
    /// Membership tables.
    pub memberships: Arc<dyn MembershipRepository>,
    /// Notifications.
    pub notifications: Arc<dyn NotificationRepository>,
    /// Linked groups.
    pub groups: Arc<dyn GroupRepository>,
    /// User settings.
    pub settings: Arc<dyn SettingsRepository>,
    /// User profiles.
    pub profiles: Arc<dyn ProfileRepository>,
    /// Auth provider.
    pub auth: Arc<dyn AuthProvider>,
}

impl Store {
    /// Bundles an adapter that implements every port.
    pub fn from_adapter<A>(adapter: Arc<A>) -> Self
    where
        A: LeadRepository
            + MembershipRepository
            + NotificationRepository
            + GroupRepository
            + SettingsRepository
            + ProfileRepository
            + AuthProvider
            + 'static,
    {
        Self {
            leads: Arc::clone(&adapter) as Arc<dyn LeadRepository>,
            memberships: Arc::clone(&adapter) as Arc<dyn MembershipRepository>,
            notifications: Arc::clone(&adapter) as Arc<dyn NotificationRepository>,
            groups: Arc::clone(&adapter) as Arc<dyn GroupRepository>,
            settings: Arc::clone(&adapter) as Arc<dyn SettingsRepository>,
            profiles: Arc::clone(&adapter) as Arc<dyn ProfileRepository>,
            auth: adapter as Arc<dyn AuthProvider>,
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
