//! One user's swipe session: gesture → state manager → feed controller.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::feed::{Candidate, Consumed, FeedController, FeedTab, TabStatus};
use super::swipe::{Decision, Gesture, SwipeCard, SwipeDirection, SwipeState};
use super::registry::SessionContext;
use crate::domain::{
    AuthUser, Lead, LeadId, MembershipKind, SessionPreferences, SessionToken, Theme,
};
use crate::error::{LeadSwipeError, SequenceStep};
use crate::service::{MembershipManager, MembershipOutcome};

/// A membership action requested outside of the swipe gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LeadAction {
    /// Bookmark.
    Save,
    /// Remove bookmark.
    Unsave,
    /// Match.
    Match,
    /// Remove match only.
    Unmatch,
    /// Block with an optional reason.
    Block {
        /// Free-text reason.
        #[serde(default)]
        reason: Option<String>,
    },
    /// Unblock.
    Unblock,
    /// Archive.
    Archive,
    /// Restore from the archive and requeue in the feed.
    Restore,
    /// Archive, then unmatch.
    RemoveMatch,
}

/// Status of the head of the active tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    /// A lead is ready.
    Ready,
    /// Waiting for the next page.
    Pending,
    /// No more leads.
    Exhausted,
}

/// Everything a view needs to render the feed.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FeedView {
    /// Active tab.
    pub tab: FeedTab,
    /// Head status.
    pub status: CandidateStatus,
    /// Head lead.
    pub lead: Option<Lead>,
    /// Whether the head is saved.
    pub saved: bool,
    /// Card state.
    pub card: SwipeState,
    /// Drag hint.
    pub hint: Option<SwipeDirection>,
    /// Queue state of the active tab.
    pub queue: TabStatus,
    /// Last feed load error.
    pub last_error: Option<String>,
}

/// Result of a committed swipe.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SwipeOutcome {
    /// Recorded decision.
    pub decision: Decision,
    /// Lead decided on.
    pub lead_id: LeadId,
    /// Membership writes, in order.
    pub memberships: Vec<MembershipOutcome>,
    /// Queue update.
    pub consumed: Consumed,
    /// The lead, when it was matched (for a match dialog).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<Lead>,
}

/// Result of feeding a gesture to the session.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GestureResult {
    /// What the card did with the gesture.
    pub gesture: Gesture,
    /// Present when the gesture committed a decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipe: Option<SwipeOutcome>,
}

/// Per-user session state.
///
/// Not shared: callers reach it through
/// [`super::SessionRegistry`], which serializes access per user.
#[derive(Debug)]
pub struct LeadSession {
    ctx: SessionContext,
    manager: MembershipManager,
    feed: FeedController,
    card: SwipeCard,
    tab: FeedTab,
    preferences: SessionPreferences,
}

impl LeadSession {
    /// Loads membership sets, groups and settings, then the first pages of
    /// both tabs.
    ///
    /// # Errors
    ///
    /// Returns a [`LeadSwipeError`] if the sets, groups or settings cannot
    /// be loaded. Feed load failures are recorded on the feed instead.
    pub async fn start(
        ctx: SessionContext,
        user: AuthUser,
        token: SessionToken,
    ) -> Result<Self, LeadSwipeError> {
        let user_id = user.id;
        let manager = MembershipManager::load(
            ctx.store.clone(),
            ctx.notifications.clone(),
            user,
            token,
        )
        .await?;
        let group_ids = ctx.groups.group_ids(user_id).await?;
        let settings = ctx.settings.get(user_id).await?;

        let mut feed = FeedController::new(
            ctx.leads.clone(),
            manager.sets(),
            group_ids,
            ctx.feed.page_size,
            ctx.feed.low_water_mark,
        );
        let all = feed.fill(FeedTab::All, manager.sets()).await;
        let groups = feed.fill(FeedTab::Groups, manager.sets()).await;
        tracing::info!(%user_id, all, groups, "lead session started");

        Ok(Self {
            card: SwipeCard::new(ctx.swipe),
            ctx,
            manager,
            feed,
            tab: FeedTab::All,
            preferences: SessionPreferences::from_settings(&settings),
        })
    }

    /// The session's user.
    #[must_use]
    pub const fn user(&self) -> &AuthUser {
        self.manager.user()
    }

    /// Membership state.
    #[must_use]
    pub const fn memberships(&self) -> &MembershipManager {
        &self.manager
    }

    /// Feed state.
    #[must_use]
    pub const fn feed(&self) -> &FeedController {
        &self.feed
    }

    /// Session preferences.
    #[must_use]
    pub const fn preferences(&self) -> &SessionPreferences {
        &self.preferences
    }

    /// Active tab.
    #[must_use]
    pub const fn tab(&self) -> FeedTab {
        self.tab
    }

    /// Switches the active tab. Ignored while a card is committing.
    pub fn set_tab(&mut self, tab: FeedTab) {
        if !self.card.is_locked() {
            self.tab = tab;
        }
    }

    /// Current feed view.
    #[must_use]
    pub fn view(&self) -> FeedView {
        let (status, lead) = match self.feed.current_candidate(self.tab) {
            Candidate::Ready(lead) => (CandidateStatus::Ready, Some(lead.clone())),
            Candidate::Pending => (CandidateStatus::Pending, None),
            Candidate::Exhausted => (CandidateStatus::Exhausted, None),
        };
        let saved = lead
            .as_ref()
            .is_some_and(|l| self.manager.sets().contains(MembershipKind::Saved, l.id));
        FeedView {
            tab: self.tab,
            status,
            lead,
            saved,
            card: self.card.state(),
            hint: self.card.hint(),
            queue: self.feed.status(self.tab),
            last_error: self.feed.last_error().map(str::to_string),
        }
    }

    fn head_id(&self) -> Option<LeadId> {
        self.feed.current_candidate(self.tab).lead().map(|l| l.id)
    }

    fn require_head(&self) -> Result<LeadId, LeadSwipeError> {
        self.head_id()
            .ok_or_else(|| LeadSwipeError::InvalidRequest("no lead to act on".to_string()))
    }

    /// Pointer pressed on the card.
    pub fn pointer_down(&mut self, x: f64) -> Gesture {
        if self.head_id().is_none() {
            return Gesture::Ignored;
        }
        self.card.pointer_down(x)
    }

    /// Pointer moved.
    pub fn pointer_move(&mut self, x: f64) -> Gesture {
        self.card.pointer_move(x)
    }

    /// Pointer released; commits the decision if the drag went far enough.
    ///
    /// # Errors
    ///
    /// Returns the recording error; the card snaps back and the lead stays.
    pub async fn release(&mut self) -> Result<GestureResult, LeadSwipeError> {
        let gesture = self.card.release();
        self.after_gesture(gesture).await
    }

    /// Like/pass button.
    ///
    /// # Errors
    ///
    /// As for [`LeadSession::release`].
    pub async fn press(&mut self, decision: Decision) -> Result<GestureResult, LeadSwipeError> {
        if self.head_id().is_none() {
            return Ok(GestureResult {
                gesture: Gesture::Ignored,
                swipe: None,
            });
        }
        let gesture = self.card.press(decision);
        self.after_gesture(gesture).await
    }

    async fn after_gesture(&mut self, gesture: Gesture) -> Result<GestureResult, LeadSwipeError> {
        let swipe = match gesture {
            Gesture::Committed { direction } => Some(self.commit(direction.decision()).await?),
            _ => None,
        };
        Ok(GestureResult { gesture, swipe })
    }

    /// Records `decision` for the head, waits out the commit delay, settles
    /// the card and consumes the lead.
    async fn commit(&mut self, decision: Decision) -> Result<SwipeOutcome, LeadSwipeError> {
        let tab = self.tab;
        let Some(lead) = self.feed.current_candidate(tab).lead().cloned() else {
            self.card.reset();
            return Err(LeadSwipeError::InvalidRequest("no lead to act on".to_string()));
        };

        let memberships = match self.record(lead.id, decision).await {
            Ok(memberships) => memberships,
            Err(err) => {
                tracing::warn!(lead_id = %lead.id, ?decision, error = %err, "swipe not recorded");
                self.card.reset();
                return Err(err);
            }
        };

        tokio::time::sleep(self.ctx.swipe.commit_delay).await;
        self.card.settle();
        let consumed = self.feed.consume(tab, lead.id, self.manager.sets()).await;
        self.feed.discard(lead.id);
        self.card.reset();

        Ok(SwipeOutcome {
            decision,
            lead_id: lead.id,
            memberships,
            consumed,
            matched: (decision == Decision::Like).then_some(lead),
        })
    }

    async fn record(
        &mut self,
        lead_id: LeadId,
        decision: Decision,
    ) -> Result<Vec<MembershipOutcome>, LeadSwipeError> {
        let viewed = self.manager.mark_viewed(lead_id).await?;
        let second = match decision {
            Decision::Like => self.manager.match_lead(lead_id).await?,
            Decision::Pass => self.manager.archive(lead_id).await?,
        };
        Ok(vec![viewed, second])
    }

    /// Toggles the bookmark on the head.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::InvalidRequest`] with no head, or the
    /// membership error.
    pub async fn save_current(&mut self) -> Result<MembershipOutcome, LeadSwipeError> {
        let lead_id = self.require_head()?;
        if self.manager.sets().contains(MembershipKind::Saved, lead_id) {
            self.manager.unsave(lead_id).await
        } else {
            self.manager.save(lead_id).await
        }
    }

    /// Blocks the head and removes it from the feed.
    ///
    /// # Errors
    ///
    /// As for [`LeadSession::save_current`]; the lead stays on failure.
    pub async fn block_current(
        &mut self,
        reason: Option<String>,
    ) -> Result<MembershipOutcome, LeadSwipeError> {
        let lead_id = self.require_head()?;
        let outcome = self.manager.block(lead_id, reason).await?;
        self.feed.consume(self.tab, lead_id, self.manager.sets()).await;
        self.feed.discard(lead_id);
        Ok(outcome)
    }

    /// Removes the head from this session's feed, on both tabs, without
    /// recording anything.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::InvalidRequest`] with no head.
    pub async fn skip_current(&mut self) -> Result<Consumed, LeadSwipeError> {
        let lead_id = self.require_head()?;
        let consumed = self.feed.consume(self.tab, lead_id, self.manager.sets()).await;
        self.feed.discard(lead_id);
        Ok(consumed)
    }

    /// Restores an archived lead, forgets it was viewed and requeues it.
    ///
    /// # Errors
    ///
    /// Returns the restore error, or [`LeadSwipeError::PartialSequence`] if
    /// the lead was restored but could not be un-viewed.
    pub async fn restore(&mut self, lead_id: LeadId) -> Result<Vec<MembershipOutcome>, LeadSwipeError> {
        let lead = self.ctx.leads.get_lead(lead_id).await?;
        let restored = self.manager.restore(lead_id).await?;
        let unviewed = self.manager.unmark_viewed(lead_id).await.map_err(|err| match err {
            LeadSwipeError::Store(source) => LeadSwipeError::PartialSequence {
                lead_id,
                completed: vec![SequenceStep {
                    kind: MembershipKind::Archived,
                    insert: false,
                }],
                failed: SequenceStep {
                    kind: MembershipKind::Viewed,
                    insert: false,
                },
                source,
            },
            other => other,
        })?;
        let tab = self.feed.requeue(lead);
        tracing::info!(%lead_id, ?tab, "lead restored to feed");
        Ok(vec![restored, unviewed])
    }

    /// Applies a membership action to any lead. Blocking or archiving drops
    /// the lead from the feed queues.
    ///
    /// # Errors
    ///
    /// Returns the membership error.
    pub async fn apply(
        &mut self,
        lead_id: LeadId,
        action: LeadAction,
    ) -> Result<Vec<MembershipOutcome>, LeadSwipeError> {
        let outcomes = match action {
            LeadAction::Save => vec![self.manager.save(lead_id).await?],
            LeadAction::Unsave => vec![self.manager.unsave(lead_id).await?],
            LeadAction::Match => vec![self.manager.match_lead(lead_id).await?],
            LeadAction::Unmatch => vec![self.manager.unmatch(lead_id).await?],
            LeadAction::Block { reason } => vec![self.manager.block(lead_id, reason).await?],
            LeadAction::Unblock => vec![self.manager.unblock(lead_id).await?],
            LeadAction::Archive => vec![self.manager.archive(lead_id).await?],
            LeadAction::Restore => return self.restore(lead_id).await,
            LeadAction::RemoveMatch => self.manager.remove_from_matches(lead_id).await?,
        };
        if outcomes.iter().any(|o| {
            o.is_member && matches!(o.kind, MembershipKind::Blocked | MembershipKind::Archived)
        }) {
            self.feed.discard(lead_id);
        }
        Ok(outcomes)
    }

    /// Reloads the membership sets from the store and drops queued leads
    /// they now exclude.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn refresh(&mut self) -> Result<(), LeadSwipeError> {
        self.manager.refresh().await?;
        let dropped = self.feed.prune(self.manager.sets());
        if dropped > 0 {
            tracing::debug!(user_id = %self.user().id, dropped, "feed pruned after refresh");
        }
        Ok(())
    }

    /// Re-reads the user's groups and reloads the `groups` tab.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] if the groups cannot be read.
    pub async fn reload_groups(&mut self) -> Result<usize, LeadSwipeError> {
        let group_ids = self.ctx.groups.group_ids(self.user().id).await?;
        self.feed.set_group_ids(group_ids);
        Ok(self.feed.fill(FeedTab::Groups, self.manager.sets()).await)
    }

    /// Loads the next page of `tab`. Returns how many leads were appended.
    pub async fn load_more(&mut self, tab: FeedTab) -> usize {
        let status = self.feed.status(tab);
        if status.page > 0 && !status.has_more {
            return 0;
        }
        self.feed
            .load_page(tab, status.page.saturating_add(1), self.manager.sets())
            .await
    }

    /// Re-reads stored settings, keeping a theme chosen in this session.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn sync_settings(&mut self) -> Result<&SessionPreferences, LeadSwipeError> {
        let settings = self.ctx.settings.get(self.user().id).await?;
        self.preferences.sync(&settings);
        Ok(&self.preferences)
    }

    /// Picks a theme for this session only.
    pub fn choose_theme(&mut self, theme: Theme) -> &SessionPreferences {
        self.preferences.choose_theme(theme);
        &self.preferences
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::FeedConfig;
    use crate::domain::EventBus;
    use crate::session::SwipeThresholds;
    use crate::domain::{MembershipRecord, NewGroup};
    use crate::store::{
        GroupRepository, InMemoryStore, MembershipRepository, Store, StoreError, StoreOp,
    };

    async fn fixture(n: i64, page_size: u32) -> (Arc<InMemoryStore>, LeadSession) {
        let store = Arc::new(InMemoryStore::new());
        for id in 1..=n {
            store
                .insert_lead(Lead::new(LeadId::new(id), format!("lead {id}")))
                .await;
        }
        let user = store.register_user("u@x.io", "pw").await;
        let token = store.issue_session(user.id).await;
        let ctx = SessionContext::new(
            Store::from_adapter(Arc::clone(&store)),
            EventBus::new(16),
            FeedConfig {
                page_size,
                low_water_mark: 3,
            },
            SwipeThresholds {
                commit_delay: Duration::ZERO,
                ..SwipeThresholds::default()
            },
        );
        let Ok(session) = LeadSession::start(ctx, user, token).await else {
            panic!("expected session to start");
        };
        (store, session)
    }

    /// Leads 1..=4; odd ids come from linked group `g1`.
    async fn grouped_fixture() -> (Arc<InMemoryStore>, LeadSession) {
        let store = Arc::new(InMemoryStore::new());
        for id in 1..=4 {
            let mut lead = Lead::new(LeadId::new(id), format!("lead {id}"));
            if id % 2 == 1 {
                lead.group_id = Some("g1".to_string());
            }
            store.insert_lead(lead).await;
        }
        let user = store.register_user("g@x.io", "pw").await;
        let group = NewGroup {
            group_id: "g1".to_string(),
            group_name: "Roofers".to_string(),
            group_url: "https://facebook.com/groups/g1".to_string(),
        };
        let Ok(Some(_)) = store.insert_group(user.id, &group, 10).await else {
            panic!("expected group to be linked");
        };
        let token = store.issue_session(user.id).await;
        let ctx = SessionContext::new(
            Store::from_adapter(Arc::clone(&store)),
            EventBus::new(16),
            FeedConfig::default(),
            SwipeThresholds {
                commit_delay: Duration::ZERO,
                ..SwipeThresholds::default()
            },
        );
        let Ok(session) = LeadSession::start(ctx, user, token).await else {
            panic!("expected session to start");
        };
        (store, session)
    }

    fn head(session: &LeadSession) -> Option<i64> {
        session.view().lead.map(|l| l.id.get())
    }

    #[tokio::test]
    async fn swipe_right_matches_and_views() {
        let (_, mut session) = fixture(5, 10).await;
        session.pointer_down(100.0);
        session.pointer_move(250.0);
        let Ok(result) = session.release().await else {
            panic!("expected swipe to commit");
        };
        let Some(swipe) = result.swipe else {
            panic!("expected swipe outcome");
        };
        assert_eq!(swipe.decision, Decision::Like);
        assert!(swipe.matched.is_some());

        let sets = session.memberships().sets();
        assert!(sets.contains(MembershipKind::Matched, LeadId::new(1)));
        assert!(sets.contains(MembershipKind::Viewed, LeadId::new(1)));
        assert_eq!(head(&session), Some(2));
        assert_eq!(session.view().card, SwipeState::Idle);
    }

    #[tokio::test]
    async fn swipe_left_archives_without_matching() {
        let (_, mut session) = fixture(5, 10).await;
        let Ok(result) = session.press(Decision::Pass).await else {
            panic!("expected pass to commit");
        };
        assert!(result.swipe.is_some());

        let sets = session.memberships().sets();
        assert!(sets.contains(MembershipKind::Archived, LeadId::new(1)));
        assert!(sets.contains(MembershipKind::Viewed, LeadId::new(1)));
        assert!(!sets.contains(MembershipKind::Matched, LeadId::new(1)));
        assert_eq!(head(&session), Some(2));
    }

    #[tokio::test]
    async fn failed_record_snaps_back_and_keeps_lead() {
        let (store, mut session) = fixture(5, 10).await;
        store
            .inject_failure(
                StoreOp::InsertMembership(MembershipKind::Archived),
                StoreError::Connection("down".into()),
            )
            .await;

        assert!(session.press(Decision::Pass).await.is_err());
        assert_eq!(head(&session), Some(1));
        assert_eq!(session.view().card, SwipeState::Idle);
        assert!(
            !session
                .memberships()
                .sets()
                .contains(MembershipKind::Archived, LeadId::new(1))
        );
    }

    #[tokio::test]
    async fn short_drag_records_nothing() {
        let (_, mut session) = fixture(3, 10).await;
        session.pointer_down(0.0);
        session.pointer_move(40.0);
        let Ok(result) = session.release().await else {
            panic!("expected release");
        };
        assert_eq!(result.gesture, Gesture::SnappedBack);
        assert!(result.swipe.is_none());
        assert_eq!(session.memberships().sets().len(MembershipKind::Viewed), 0);
    }

    #[tokio::test]
    async fn start_skips_previously_viewed_leads() {
        let (store, session) = fixture(5, 10).await;
        let user = session.user().clone();
        drop(session);

        let token = store.issue_session(user.id).await;
        let ctx = SessionContext::new(
            Store::from_adapter(Arc::clone(&store)),
            EventBus::new(16),
            FeedConfig::default(),
            SwipeThresholds::default(),
        );
        let Ok(mut first) = LeadSession::start(ctx.clone(), user.clone(), token.clone()).await
        else {
            panic!("expected session");
        };
        let Ok(_) = first.apply(LeadId::new(1), LeadAction::Archive).await else {
            panic!("expected archive");
        };
        assert_eq!(head(&first), Some(2));

        let Ok(second) = LeadSession::start(ctx, user, token).await else {
            panic!("expected second session");
        };
        assert_eq!(head(&second), Some(2));
    }

    #[tokio::test]
    async fn low_water_mark_triggers_fetch() {
        let (_, mut session) = fixture(8, 2).await;
        // fill loaded pages until more than three leads were queued
        assert_eq!(session.view().queue.remaining, 4);

        let Ok(result) = session.press(Decision::Like).await else {
            panic!("expected like");
        };
        let Some(swipe) = result.swipe else {
            panic!("expected swipe outcome");
        };
        assert_eq!(swipe.consumed.fetched, 2);
        assert_eq!(session.view().queue.remaining, 5);
    }

    #[tokio::test]
    async fn restore_requeues_and_unviews() {
        let (_, mut session) = fixture(2, 10).await;
        let Ok(_) = session.press(Decision::Pass).await else {
            panic!("expected pass");
        };
        assert_eq!(head(&session), Some(2));

        let Ok(outcomes) = session.restore(LeadId::new(1)).await else {
            panic!("expected restore");
        };
        assert_eq!(outcomes.len(), 2);
        let ids: Vec<i64> = session
            .feed()
            .candidates(FeedTab::All)
            .map(|l| l.id.get())
            .collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(
            !session
                .memberships()
                .sets()
                .contains(MembershipKind::Viewed, LeadId::new(1))
        );
    }

    #[tokio::test]
    async fn swiped_lead_leaves_the_other_tab() {
        let (_, mut session) = grouped_fixture().await;
        assert_eq!(head(&session), Some(1));

        let Ok(_) = session.press(Decision::Like).await else {
            panic!("expected like");
        };
        session.set_tab(FeedTab::Groups);
        assert_eq!(head(&session), Some(3));

        let Ok(_) = session.press(Decision::Pass).await else {
            panic!("expected pass");
        };
        session.set_tab(FeedTab::All);
        let all: Vec<i64> = session
            .feed()
            .candidates(FeedTab::All)
            .map(|l| l.id.get())
            .collect();
        assert_eq!(all, vec![2, 4]);
    }

    #[tokio::test]
    async fn block_and_skip_leave_the_other_tab() {
        let (_, mut session) = grouped_fixture().await;
        let Ok(_) = session.block_current(None).await else {
            panic!("expected block");
        };
        assert_eq!(head(&session), Some(2));

        session.set_tab(FeedTab::Groups);
        assert_eq!(head(&session), Some(3));
        let Ok(_) = session.skip_current().await else {
            panic!("expected skip");
        };
        assert_eq!(session.view().status, CandidateStatus::Exhausted);
        assert!(session.feed().candidates(FeedTab::All).all(|l| l.id.get() % 2 == 0));
    }

    #[tokio::test]
    async fn refresh_drops_leads_acted_on_elsewhere() {
        let (store, mut session) = grouped_fixture().await;
        let user_id = session.user().id;
        let record = MembershipRecord::new(user_id, LeadId::new(3), MembershipKind::Archived);
        let Ok(_) = store.insert_membership(&record).await else {
            panic!("expected archive row");
        };
        assert!(session.feed().candidates(FeedTab::Groups).any(|l| l.id.get() == 3));

        let Ok(()) = session.refresh().await else {
            panic!("expected refresh");
        };
        assert!(!session.feed().candidates(FeedTab::Groups).any(|l| l.id.get() == 3));
        assert!(!session.feed().candidates(FeedTab::All).any(|l| l.id.get() == 3));
    }

    #[tokio::test]
    async fn save_current_toggles() {
        let (_, mut session) = fixture(2, 10).await;
        let Ok(saved) = session.save_current().await else {
            panic!("expected save");
        };
        assert!(saved.is_member);
        assert!(session.view().saved);

        let Ok(unsaved) = session.save_current().await else {
            panic!("expected unsave");
        };
        assert!(!unsaved.is_member);
    }

    #[tokio::test]
    async fn block_and_skip_remove_head() {
        let (_, mut session) = fixture(3, 10).await;
        let Ok(_) = session.block_current(Some("spam".into())).await else {
            panic!("expected block");
        };
        assert_eq!(head(&session), Some(2));

        let Ok(_) = session.skip_current().await else {
            panic!("expected skip");
        };
        assert_eq!(head(&session), Some(3));
        assert_eq!(session.memberships().sets().len(MembershipKind::Viewed), 0);
    }

    #[tokio::test]
    async fn manual_theme_is_session_scoped() {
        let (_, mut session) = fixture(1, 10).await;
        session.choose_theme(Theme::Dark);
        let Ok(prefs) = session.sync_settings().await else {
            panic!("expected sync");
        };
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(prefs.manual_override);
    }

    #[tokio::test]
    async fn exhausted_feed_ignores_press() {
        let (_, mut session) = fixture(0, 10).await;
        assert_eq!(session.view().status, CandidateStatus::Exhausted);
        let Ok(result) = session.press(Decision::Like).await else {
            panic!("expected ignored press");
        };
        assert_eq!(result.gesture, Gesture::Ignored);
    }
}
