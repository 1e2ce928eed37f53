//! In-memory adapter for every store port.
//!
//! Backs the default `memory` backend and all tests. Operations can be made
//! to fail on demand with [`InMemoryStore::inject_failure`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    AuthProvider, GroupRepository, LeadQuery, LeadRepository, MembershipRepository,
    NotificationRepository, ProfileRepository, SettingsRepository, StoreError,
};
use crate::domain::{
    AuthUser, FacebookGroup, Lead, LeadId, MembershipKind, MembershipRecord, NewGroup,
    NewNotification, Notification, SessionToken, UserId, UserProfile, UserSettings,
};
use crate::query::matches_search;

/// A store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// [`LeadRepository::count_leads`].
    CountLeads,
    /// [`LeadRepository::fetch_leads`].
    FetchLeads,
    /// [`MembershipRepository::membership_ids`] for one kind.
    MembershipIds(MembershipKind),
    /// [`MembershipRepository::insert_membership`] for one kind.
    InsertMembership(MembershipKind),
    /// [`MembershipRepository::delete_membership`] for one kind.
    DeleteMembership(MembershipKind),
    /// [`NotificationRepository::insert_notification`].
    InsertNotification,
    /// [`GroupRepository::insert_group`].
    InsertGroup,
    /// [`SettingsRepository::upsert_settings`].
    UpsertSettings,
    /// [`ProfileRepository::upsert_profile`].
    UpsertProfile,
    /// [`AuthProvider::current_user`].
    CurrentUser,
}

#[derive(Debug)]
struct Account {
    user: AuthUser,
    password: String,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, UserId>,
    leads: BTreeMap<LeadId, Lead>,
    memberships: HashMap<(UserId, MembershipKind), BTreeMap<LeadId, MembershipRecord>>,
    notifications: Vec<Notification>,
    next_notification_id: i64,
    groups: Vec<FacebookGroup>,
    next_group_id: i64,
    settings: HashMap<UserId, UserSettings>,
    profiles: HashMap<UserId, UserProfile>,
    failures: HashMap<StoreOp, StoreError>,
}

impl Tables {
    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        self.failures.get(&op).map_or(Ok(()), |err| Err(err.clone()))
    }

    fn matching<'a>(&'a self, query: &'a LeadQuery) -> impl Iterator<Item = &'a Lead> + 'a {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        self.leads.values().filter(move |lead| {
            if let Some(ids) = &query.include_ids {
                if !ids.contains(&lead.id) {
                    return false;
                }
            }
            if query.exclude_ids.contains(&lead.id) {
                return false;
            }
            if let Some(groups) = &query.group_ids {
                if !lead.in_groups(groups) {
                    return false;
                }
            }
            if let Some(group_id) = &query.group_id {
                if lead.group_id.as_ref() != Some(group_id) {
                    return false;
                }
            }
            search.is_none_or(|term| matches_search(lead, term))
        })
    }
}

/// In-memory implementation of every store port.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account and returns its user.
    pub async fn register_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: UserId::new(),
            email: email.to_string(),
        };
        let mut tables = self.tables.write().await;
        tables.accounts.insert(
            email.to_ascii_lowercase(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Issues a session for an existing user without a password check.
    pub async fn issue_session(&self, user_id: UserId) -> SessionToken {
        let token = SessionToken::generate();
        self.tables
            .write()
            .await
            .sessions
            .insert(token.as_str().to_string(), user_id);
        token
    }

    /// Inserts or replaces a lead.
    pub async fn insert_lead(&self, lead: Lead) {
        self.tables.write().await.leads.insert(lead.id, lead);
    }

    /// Inserts every lead of a JSON array. Returns the number loaded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] if `json` is not an array of leads.
    pub async fn load_leads_json(&self, json: &str) -> Result<usize, StoreError> {
        let leads: Vec<Lead> =
            serde_json::from_str(json).map_err(|e| StoreError::Query(e.to_string()))?;
        let count = leads.len();
        let mut tables = self.tables.write().await;
        for lead in leads {
            tables.leads.insert(lead.id, lead);
        }
        Ok(count)
    }

    /// Makes every later call of `op` fail with `error`.
    pub async fn inject_failure(&self, op: StoreOp, error: StoreError) {
        self.tables.write().await.failures.insert(op, error);
    }

    /// Removes every injected failure.
    pub async fn clear_failures(&self) {
        self.tables.write().await.failures.clear();
    }
}

#[async_trait]
impl LeadRepository for InMemoryStore {
    async fn count_leads(&self, query: &LeadQuery) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        tables.check(StoreOp::CountLeads)?;
        Ok(tables.matching(query).count() as u64)
    }

    async fn fetch_leads(
        &self,
        query: &LeadQuery,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Lead>, StoreError> {
        let tables = self.tables.read().await;
        tables.check(StoreOp::FetchLeads)?;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(tables
            .matching(query)
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, StoreError> {
        Ok(self.tables.read().await.leads.get(&id).cloned())
    }
}

#[async_trait]
impl MembershipRepository for InMemoryStore {
    async fn membership_ids(
        &self,
        user_id: UserId,
        kind: MembershipKind,
    ) -> Result<Vec<LeadId>, StoreError> {
        let tables = self.tables.read().await;
        tables.check(StoreOp::MembershipIds(kind))?;
        Ok(tables
            .memberships
            .get(&(user_id, kind))
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn insert_membership(&self, record: &MembershipRecord) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check(StoreOp::InsertMembership(record.kind))?;
        let rows = tables
            .memberships
            .entry((record.user_id, record.kind))
            .or_default();
        if rows.contains_key(&record.lead_id) {
            return Ok(false);
        }
        rows.insert(record.lead_id, record.clone());
        Ok(true)
    }

    async fn delete_membership(
        &self,
        user_id: UserId,
        lead_id: LeadId,
        kind: MembershipKind,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check(StoreOp::DeleteMembership(kind))?;
        Ok(tables
            .memberships
            .get_mut(&(user_id, kind))
            .is_some_and(|rows| rows.remove(&lead_id).is_some()))
    }

    async fn count_memberships(
        &self,
        user_id: UserId,
        kind: MembershipKind,
    ) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .get(&(user_id, kind))
            .map_or(0, |rows| rows.len() as u64))
    }

    async fn blocked_records(&self, user_id: UserId) -> Result<Vec<MembershipRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut records: Vec<MembershipRecord> = tables
            .memberships
            .get(&(user_id, MembershipKind::Blocked))
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check(StoreOp::InsertNotification)?;
        tables.next_notification_id += 1;
        let stored = Notification {
            id: tables.next_notification_id,
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title.clone(),
            message: notification.message.clone(),
            lead_id: notification.lead_id,
            is_read: false,
            created_at: Utc::now(),
            action_url: notification.action_url.clone(),
        };
        tables.notifications.push(stored.clone());
        Ok(stored)
    }

    async fn notifications_for(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_unread(&self, user_id: UserId) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, user_id: UserId, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        else {
            return Ok(false);
        };
        row.is_read = true;
        Ok(true)
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for row in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            row.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_notification(&self, user_id: UserId, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.notifications.len();
        tables
            .notifications
            .retain(|n| !(n.id == id && n.user_id == user_id));
        Ok(tables.notifications.len() < before)
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn groups_for(&self, user_id: UserId) -> Result<Vec<FacebookGroup>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_group(
        &self,
        user_id: UserId,
        group: &NewGroup,
        limit: usize,
    ) -> Result<Option<FacebookGroup>, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check(StoreOp::InsertGroup)?;
        let owned = tables.groups.iter().filter(|g| g.user_id == user_id);
        if owned.clone().any(|g| g.group_id == group.group_id) {
            return Err(StoreError::Conflict(format!(
                "group {} already linked",
                group.group_id
            )));
        }
        if owned.count() >= limit {
            return Ok(None);
        }
        tables.next_group_id += 1;
        let stored = FacebookGroup {
            id: tables.next_group_id,
            user_id,
            group_id: group.group_id.clone(),
            group_name: group.group_name.clone(),
            group_url: group.group_url.clone(),
            created_at: Utc::now(),
        };
        tables.groups.push(stored.clone());
        Ok(Some(stored))
    }

    async fn delete_group(&self, user_id: UserId, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.groups.len();
        tables
            .groups
            .retain(|g| !(g.id == id && g.user_id == user_id));
        Ok(tables.groups.len() < before)
    }
}

#[async_trait]
impl SettingsRepository for InMemoryStore {
    async fn settings_for(&self, user_id: UserId) -> Result<Option<UserSettings>, StoreError> {
        Ok(self.tables.read().await.settings.get(&user_id).cloned())
    }

    async fn upsert_settings(&self, settings: &UserSettings) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.check(StoreOp::UpsertSettings)?;
        tables.settings.insert(settings.user_id, settings.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn profile_for(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check(StoreOp::UpsertProfile)?;
        let mut stored = profile.clone();
        if let Some(existing) = tables.profiles.get(&profile.user_id) {
            stored.created_at = existing.created_at;
        }
        tables.profiles.insert(stored.user_id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl AuthProvider for InMemoryStore {
    async fn current_user(&self, token: &SessionToken) -> Result<Option<AuthUser>, StoreError> {
        let tables = self.tables.read().await;
        tables.check(StoreOp::CurrentUser)?;
        let Some(user_id) = tables.sessions.get(token.as_str()) else {
            return Ok(None);
        };
        Ok(tables
            .accounts
            .values()
            .find(|a| a.user.id == *user_id)
            .map(|a| a.user.clone()))
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<(AuthUser, SessionToken)>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(account) = tables.accounts.get(&email.to_ascii_lowercase()) else {
            return Ok(None);
        };
        if account.password != password {
            return Ok(None);
        }
        let user = account.user.clone();
        let token = SessionToken::generate();
        tables.sessions.insert(token.as_str().to_string(), user.id);
        Ok(Some((user, token)))
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), StoreError> {
        self.tables.write().await.sessions.remove(token.as_str());
        Ok(())
    }
}
