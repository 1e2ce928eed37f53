//! Match/save/block/archive state manager.
//!
//! [`MembershipManager`] owns one user's [`MembershipSets`] and keeps them in
//! step with the store: every mutation is authorized, written remotely, and
//! only then applied locally. A failed write leaves the sets untouched.

use serde::Serialize;
use utoipa::ToSchema;

use super::NotificationService;
use crate::domain::{
    AuthUser, DeliveryOutcome, LeadId, MembershipKind, MembershipRecord, MembershipSets,
    NewNotification, SessionToken,
};
use crate::error::{LeadSwipeError, SequenceStep};
use crate::store::{Store, StoreError};

/// Result of one membership mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MembershipOutcome {
    /// Relation that was touched.
    pub kind: MembershipKind,
    /// Lead that was touched.
    pub lead_id: LeadId,
    /// Whether the lead is now in the set.
    pub is_member: bool,
    /// Whether the store row was created or deleted by this call.
    pub changed: bool,
    /// Size of the set afterwards.
    pub set_size: usize,
    /// Outcome of the side-effect notification, for matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<DeliveryOutcome>,
}

/// Per-user membership state bound to one auth session.
#[derive(Debug)]
pub struct MembershipManager {
    store: Store,
    notifications: NotificationService,
    user: AuthUser,
    token: SessionToken,
    sets: MembershipSets,
}

impl MembershipManager {
    /// Loads every membership set for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] if any set fails to load.
    pub async fn load(
        store: Store,
        notifications: NotificationService,
        user: AuthUser,
        token: SessionToken,
    ) -> Result<Self, LeadSwipeError> {
        let mut manager = Self {
            store,
            notifications,
            user,
            token,
            sets: MembershipSets::new(),
        };
        manager.refresh().await?;
        Ok(manager)
    }

    /// The user this manager acts for.
    #[must_use]
    pub const fn user(&self) -> &AuthUser {
        &self.user
    }

    /// Local membership sets.
    #[must_use]
    pub const fn sets(&self) -> &MembershipSets {
        &self.sets
    }

    /// Reloads every set from the store.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure; the local sets
    /// are left as they were.
    pub async fn refresh(&mut self) -> Result<(), LeadSwipeError> {
        let mut fresh = MembershipSets::new();
        for kind in MembershipKind::ALL {
            let ids = self
                .store
                .memberships
                .membership_ids(self.user.id, kind)
                .await?;
            fresh.replace(kind, ids);
        }
        self.sets = fresh;
        tracing::debug!(
            user_id = %self.user.id,
            viewed = self.sets.len(MembershipKind::Viewed),
            matched = self.sets.len(MembershipKind::Matched),
            "membership sets loaded"
        );
        Ok(())
    }

    /// Confirms the auth session is still valid for this user.
    async fn authorize(&self) -> Result<(), LeadSwipeError> {
        match self.store.auth.current_user(&self.token).await? {
            Some(current) if current.id == self.user.id => Ok(()),
            _ => {
                tracing::warn!(user_id = %self.user.id, "membership write without valid session");
                Err(LeadSwipeError::Unauthenticated)
            }
        }
    }

    /// Remote write followed by the local set update.
    async fn write(
        &mut self,
        kind: MembershipKind,
        lead_id: LeadId,
        insert: bool,
        reason: Option<String>,
    ) -> Result<MembershipOutcome, StoreError> {
        let result = if insert {
            let record = MembershipRecord::new(self.user.id, lead_id, kind).with_reason(reason);
            self.store.memberships.insert_membership(&record).await
        } else {
            self.store
                .memberships
                .delete_membership(self.user.id, lead_id, kind)
                .await
        };

        let changed = match result {
            Ok(changed) => changed,
            Err(err) => {
                tracing::error!(
                    user_id = %self.user.id,
                    %lead_id,
                    %kind,
                    insert,
                    error = %err,
                    "membership write failed"
                );
                return Err(err);
            }
        };

        if insert {
            self.sets.insert(kind, lead_id);
        } else {
            self.sets.remove(kind, lead_id);
        }
        tracing::info!(user_id = %self.user.id, %lead_id, %kind, insert, changed, "membership updated");

        Ok(MembershipOutcome {
            kind,
            lead_id,
            is_member: insert,
            changed,
            set_size: self.sets.len(kind),
            notification: None,
        })
    }

    async fn add(
        &mut self,
        kind: MembershipKind,
        lead_id: LeadId,
        reason: Option<String>,
    ) -> Result<MembershipOutcome, LeadSwipeError> {
        self.authorize().await?;
        Ok(self.write(kind, lead_id, true, reason).await?)
    }

    async fn remove(
        &mut self,
        kind: MembershipKind,
        lead_id: LeadId,
    ) -> Result<MembershipOutcome, LeadSwipeError> {
        self.authorize().await?;
        Ok(self.write(kind, lead_id, false, None).await?)
    }

    /// Bookmarks a lead.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Unauthenticated`] without a valid session,
    /// or [`LeadSwipeError::Store`] if the write fails.
    pub async fn save(&mut self, lead_id: LeadId) -> Result<MembershipOutcome, LeadSwipeError> {
        self.add(MembershipKind::Saved, lead_id, None).await
    }

    /// Removes a bookmark.
    ///
    /// # Errors
    ///
    /// As for [`MembershipManager::save`].
    pub async fn unsave(&mut self, lead_id: LeadId) -> Result<MembershipOutcome, LeadSwipeError> {
        self.remove(MembershipKind::Saved, lead_id).await
    }

    /// Matches a lead and enqueues a "New Match!" notification.
    ///
    /// The notification is only attempted when the match row is new, and
    /// its outcome never fails the match.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::LeadNotFound`] for an unknown lead, plus
    /// the errors of [`MembershipManager::save`].
    pub async fn match_lead(&mut self, lead_id: LeadId) -> Result<MembershipOutcome, LeadSwipeError> {
        self.authorize().await?;
        let lead = self
            .store
            .leads
            .get_lead(lead_id)
            .await?
            .ok_or(LeadSwipeError::LeadNotFound(lead_id))?;

        let mut outcome = self
            .write(MembershipKind::Matched, lead_id, true, None)
            .await?;
        if outcome.changed {
            let notification =
                NewNotification::new_match(self.user.id, lead_id, &lead.display_name());
            outcome.notification = Some(self.notifications.create(&self.user, notification).await);
        }
        Ok(outcome)
    }

    /// Removes a match.
    ///
    /// # Errors
    ///
    /// As for [`MembershipManager::save`].
    pub async fn unmatch(&mut self, lead_id: LeadId) -> Result<MembershipOutcome, LeadSwipeError> {
        self.remove(MembershipKind::Matched, lead_id).await
    }

    /// Blocks a lead with an optional reason.
    ///
    /// # Errors
    ///
    /// As for [`MembershipManager::save`].
    pub async fn block(
        &mut self,
        lead_id: LeadId,
        reason: Option<String>,
    ) -> Result<MembershipOutcome, LeadSwipeError> {
        self.add(MembershipKind::Blocked, lead_id, reason).await
    }

    /// Unblocks a lead.
    ///
    /// # Errors
    ///
    /// As for [`MembershipManager::save`].
    pub async fn unblock(&mut self, lead_id: LeadId) -> Result<MembershipOutcome, LeadSwipeError> {
        self.remove(MembershipKind::Blocked, lead_id).await
    }

    /// Archives a lead.
    ///
    /// # Errors
    ///
    /// As for [`MembershipManager::save`].
    pub async fn archive(&mut self, lead_id: LeadId) -> Result<MembershipOutcome, LeadSwipeError> {
        self.add(MembershipKind::Archived, lead_id, None).await
    }

    /// Takes a lead out of the archive.
    ///
    /// # Errors
    ///
    /// As for [`MembershipManager::save`].
    pub async fn restore(&mut self, lead_id: LeadId) -> Result<MembershipOutcome, LeadSwipeError> {
        self.remove(MembershipKind::Archived, lead_id).await
    }

    /// Records that a lead was decided on in the feed.
    ///
    /// # Errors
    ///
    /// As for [`MembershipManager::save`].
    pub async fn mark_viewed(&mut self, lead_id: LeadId) -> Result<MembershipOutcome, LeadSwipeError> {
        self.add(MembershipKind::Viewed, lead_id, None).await
    }

    /// Forgets that a lead was viewed so the feed may show it again.
    ///
    /// # Errors
    ///
    /// As for [`MembershipManager::save`].
    pub async fn unmark_viewed(
        &mut self,
        lead_id: LeadId,
    ) -> Result<MembershipOutcome, LeadSwipeError> {
        self.remove(MembershipKind::Viewed, lead_id).await
    }

    /// Archives a matched lead, then unmatches it.
    ///
    /// The unmatch only runs if the archive succeeded. Nothing is rolled
    /// back: if the unmatch fails the lead stays archived and matched.
    ///
    /// # Errors
    ///
    /// Returns the archive error if the first step fails, or
    /// [`LeadSwipeError::PartialSequence`] if the second one does.
    pub async fn remove_from_matches(
        &mut self,
        lead_id: LeadId,
    ) -> Result<Vec<MembershipOutcome>, LeadSwipeError> {
        self.authorize().await?;
        let archived = self
            .write(MembershipKind::Archived, lead_id, true, None)
            .await?;
        let unmatched = self
            .write(MembershipKind::Matched, lead_id, false, None)
            .await
            .map_err(|source| LeadSwipeError::PartialSequence {
                lead_id,
                completed: vec![SequenceStep {
                    kind: MembershipKind::Archived,
                    insert: true,
                }],
                failed: SequenceStep {
                    kind: MembershipKind::Matched,
                    insert: false,
                },
                source,
            })?;
        Ok(vec![archived, unmatched])
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{EventBus, Lead};
    use crate::store::{AuthProvider, InMemoryStore, MembershipRepository, StoreOp};

    async fn fixture() -> (Arc<InMemoryStore>, MembershipManager) {
        let store = Arc::new(InMemoryStore::new());
        let mut lead = Lead::new(LeadId::new(1), "jane");
        lead.first_name = Some("Jane".to_string());
        lead.last_name = Some("Doe".to_string());
        store.insert_lead(lead).await;
        store.insert_lead(Lead::new(LeadId::new(2), "Bob")).await;

        let user = store.register_user("u@x.io", "pw").await;
        let token = store.issue_session(user.id).await;
        let ports = Store::from_adapter(Arc::clone(&store));
        let notifications = NotificationService::new(ports.clone(), EventBus::new(16));
        let Ok(manager) = MembershipManager::load(ports, notifications, user, token).await else {
            panic!("expected manager to load");
        };
        (store, manager)
    }

    #[tokio::test]
    async fn save_then_unsave_restores_state() {
        let (_, mut manager) = fixture().await;
        let before = manager.sets().clone();

        let Ok(saved) = manager.save(LeadId::new(1)).await else {
            panic!("expected save");
        };
        assert!(saved.is_member);
        assert_eq!(saved.set_size, 1);

        let Ok(unsaved) = manager.unsave(LeadId::new(1)).await else {
            panic!("expected unsave");
        };
        assert!(!unsaved.is_member);
        assert_eq!(manager.sets(), &before);
    }

    #[tokio::test]
    async fn double_match_keeps_one_row_and_one_notification() {
        let (store, mut manager) = fixture().await;
        let user_id = manager.user().id;

        let Ok(first) = manager.match_lead(LeadId::new(1)).await else {
            panic!("expected match");
        };
        let Some(DeliveryOutcome::Delivered { notification }) = first.notification else {
            panic!("expected delivered notification");
        };
        assert_eq!(
            notification.message,
            "You matched with Jane Doe. Start a conversation now!"
        );

        let Ok(second) = manager.match_lead(LeadId::new(1)).await else {
            panic!("expected second match");
        };
        assert!(!second.changed);
        assert!(second.notification.is_none());
        assert_eq!(
            store.count_memberships(user_id, MembershipKind::Matched).await,
            Ok(1)
        );
    }

    #[tokio::test]
    async fn match_survives_notification_failure() {
        let (store, mut manager) = fixture().await;
        store
            .inject_failure(
                StoreOp::InsertNotification,
                StoreError::PermissionDenied("policy".into()),
            )
            .await;

        let Ok(outcome) = manager.match_lead(LeadId::new(2)).await else {
            panic!("expected match despite notification failure");
        };
        assert!(matches!(
            outcome.notification,
            Some(DeliveryOutcome::Deferred { .. })
        ));
        assert!(manager.sets().contains(MembershipKind::Matched, LeadId::new(2)));
    }

    #[tokio::test]
    async fn failed_write_leaves_sets_unchanged() {
        let (store, mut manager) = fixture().await;
        store
            .inject_failure(
                StoreOp::InsertMembership(MembershipKind::Blocked),
                StoreError::Connection("down".into()),
            )
            .await;

        let result = manager.block(LeadId::new(1), Some("spam".into())).await;
        assert!(matches!(result, Err(LeadSwipeError::Store(_))));
        assert!(!manager.sets().contains(MembershipKind::Blocked, LeadId::new(1)));
    }

    #[tokio::test]
    async fn signed_out_session_is_rejected() {
        let (store, mut manager) = fixture().await;
        let Ok(()) = store.sign_out(&manager.token).await else {
            panic!("expected sign-out");
        };
        assert!(matches!(
            manager.archive(LeadId::new(1)).await,
            Err(LeadSwipeError::Unauthenticated)
        ));
        assert_eq!(manager.sets().len(MembershipKind::Archived), 0);
    }

    #[tokio::test]
    async fn remove_from_matches_archives_then_unmatches() {
        let (_, mut manager) = fixture().await;
        let Ok(_) = manager.match_lead(LeadId::new(1)).await else {
            panic!("expected match");
        };

        let Ok(steps) = manager.remove_from_matches(LeadId::new(1)).await else {
            panic!("expected removal");
        };
        assert_eq!(steps.len(), 2);
        assert!(manager.sets().contains(MembershipKind::Archived, LeadId::new(1)));
        assert!(!manager.sets().contains(MembershipKind::Matched, LeadId::new(1)));
    }

    #[tokio::test]
    async fn failed_unmatch_reports_partial_sequence() {
        let (store, mut manager) = fixture().await;
        let Ok(_) = manager.match_lead(LeadId::new(1)).await else {
            panic!("expected match");
        };
        store
            .inject_failure(
                StoreOp::DeleteMembership(MembershipKind::Matched),
                StoreError::Connection("reset".into()),
            )
            .await;

        let Err(LeadSwipeError::PartialSequence { completed, .. }) =
            manager.remove_from_matches(LeadId::new(1)).await
        else {
            panic!("expected partial sequence");
        };
        assert_eq!(completed.len(), 1);
        assert!(manager.sets().contains(MembershipKind::Archived, LeadId::new(1)));
        assert!(manager.sets().contains(MembershipKind::Matched, LeadId::new(1)));
    }

    #[tokio::test]
    async fn failed_archive_skips_unmatch() {
        let (store, mut manager) = fixture().await;
        let Ok(_) = manager.match_lead(LeadId::new(1)).await else {
            panic!("expected match");
        };
        store
            .inject_failure(
                StoreOp::InsertMembership(MembershipKind::Archived),
                StoreError::Query("nope".into()),
            )
            .await;

        assert!(matches!(
            manager.remove_from_matches(LeadId::new(1)).await,
            Err(LeadSwipeError::Store(_))
        ));
        assert!(manager.sets().contains(MembershipKind::Matched, LeadId::new(1)));
    }

    #[tokio::test]
    async fn unknown_lead_cannot_be_matched() {
        let (_, mut manager) = fixture().await;
        assert!(matches!(
            manager.match_lead(LeadId::new(404)).await,
            Err(LeadSwipeError::LeadNotFound(_))
        ));
    }
}
