//! Lead feed controller: candidate queues for the `all` and `groups` tabs.
//!
//! Pages are queried with the exclusion snapshot taken when the session
//! started, so page offsets stay stable while the user swipes. Each fetched
//! page is then filtered again with the live membership sets before it is
//! appended.

use std::collections::{HashSet, VecDeque};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Lead, LeadId, MembershipKind, MembershipSets};
use crate::query::PageRequest;
use crate::service::LeadService;
use crate::store::LeadQuery;

/// Upper bound on consecutive page loads in [`FeedController::fill`].
const MAX_FILL_PAGES: usize = 10;

/// Feed tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedTab {
    /// Every lead.
    #[default]
    All,
    /// Leads from the user's linked groups.
    Groups,
}

impl FromStr for FeedTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "groups" => Ok(Self::Groups),
            other => Err(format!("unknown feed tab: {other}")),
        }
    }
}

/// Head of a tab's queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate<'a> {
    /// The lead to show.
    Ready(&'a Lead),
    /// The queue is empty but more pages exist.
    Pending,
    /// Nothing left to show.
    Exhausted,
}

impl Candidate<'_> {
    /// The lead, if one is ready.
    #[must_use]
    pub const fn lead(&self) -> Option<&Lead> {
        match self {
            Self::Ready(lead) => Some(*lead),
            Self::Pending | Self::Exhausted => None,
        }
    }
}

/// Result of [`FeedController::consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Consumed {
    /// Whether the lead was in the queue.
    pub removed: bool,
    /// Leads appended by a triggered page load.
    pub fetched: usize,
}

/// Snapshot of one tab for callers that do not hold the session lock.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TabStatus {
    /// Tab.
    pub tab: FeedTab,
    /// Leads queued.
    pub remaining: usize,
    /// Last page loaded.
    pub page: u32,
    /// Whether more pages exist.
    pub has_more: bool,
    /// Whether a load is in flight.
    pub loading: bool,
}

#[derive(Debug, Default)]
struct TabState {
    candidates: VecDeque<Lead>,
    page: u32,
    has_more: bool,
    loading: bool,
}

impl TabState {
    fn holds(&self, id: LeadId) -> bool {
        self.candidates.iter().any(|lead| lead.id == id)
    }
}

/// Drops every lead that is viewed, blocked or archived.
#[must_use]
pub fn exclude_ids(
    leads: Vec<Lead>,
    viewed: &HashSet<LeadId>,
    blocked: &HashSet<LeadId>,
    archived: &HashSet<LeadId>,
) -> Vec<Lead> {
    leads
        .into_iter()
        .filter(|lead| {
            !viewed.contains(&lead.id) && !blocked.contains(&lead.id) && !archived.contains(&lead.id)
        })
        .collect()
}

/// Candidate queues, page cursors and load flags for both tabs.
#[derive(Debug)]
pub struct FeedController {
    leads: LeadService,
    all: TabState,
    groups: TabState,
    snapshot: Vec<LeadId>,
    group_ids: Vec<String>,
    page_size: u32,
    low_water_mark: usize,
    last_error: Option<String>,
}

impl FeedController {
    /// Creates an empty controller.
    ///
    /// `snapshot` is the set of excluded ids at session start; `group_ids`
    /// scopes the `groups` tab.
    #[must_use]
    pub fn new(
        leads: LeadService,
        snapshot: &MembershipSets,
        group_ids: Vec<String>,
        page_size: u32,
        low_water_mark: usize,
    ) -> Self {
        let mut snapshot: Vec<LeadId> = snapshot.feed_exclusions().into_iter().collect();
        snapshot.sort_unstable();
        Self {
            leads,
            all: TabState::default(),
            groups: TabState::default(),
            snapshot,
            group_ids,
            page_size: page_size.max(1),
            low_water_mark,
            last_error: None,
        }
    }

    const fn tab(&self, tab: FeedTab) -> &TabState {
        match tab {
            FeedTab::All => &self.all,
            FeedTab::Groups => &self.groups,
        }
    }

    fn tab_mut(&mut self, tab: FeedTab) -> &mut TabState {
        match tab {
            FeedTab::All => &mut self.all,
            FeedTab::Groups => &mut self.groups,
        }
    }

    /// Message of the last failed load, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Group ids scoping the `groups` tab.
    #[must_use]
    pub fn group_ids(&self) -> &[String] {
        &self.group_ids
    }

    /// Queue length, page cursor and flags of `tab`.
    #[must_use]
    pub fn status(&self, tab: FeedTab) -> TabStatus {
        let state = self.tab(tab);
        TabStatus {
            tab,
            remaining: state.candidates.len(),
            page: state.page,
            has_more: state.has_more,
            loading: state.loading,
        }
    }

    /// Leads queued on `tab`, head first.
    pub fn candidates(&self, tab: FeedTab) -> impl Iterator<Item = &Lead> {
        self.tab(tab).candidates.iter()
    }

    /// The lead to show on `tab`.
    #[must_use]
    pub fn current_candidate(&self, tab: FeedTab) -> Candidate<'_> {
        let state = self.tab(tab);
        match state.candidates.front() {
            Some(lead) => Candidate::Ready(lead),
            None if state.has_more => Candidate::Pending,
            None => Candidate::Exhausted,
        }
    }

    /// Loads `page` of `tab` and appends the leads not already queued and
    /// not excluded by `live`. Returns how many were appended.
    ///
    /// A failed load records [`FeedController::last_error`] and leaves the
    /// queue unchanged.
    pub async fn load_page(&mut self, tab: FeedTab, page: u32, live: &MembershipSets) -> usize {
        if tab == FeedTab::Groups && self.group_ids.is_empty() {
            let state = self.tab_mut(tab);
            state.has_more = false;
            state.page = page.max(1);
            return 0;
        }

        let query = LeadQuery {
            exclude_ids: self.snapshot.clone(),
            group_ids: (tab == FeedTab::Groups).then(|| self.group_ids.clone()),
            ..LeadQuery::default()
        };
        let request = PageRequest::new(page, self.page_size);

        self.tab_mut(tab).loading = true;
        let result = self.leads.query_page(&query, request).await;
        self.tab_mut(tab).loading = false;

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(err) => {
                tracing::warn!(?tab, page, error = %err, "feed page load failed");
                self.last_error = Some(err.to_string());
                return 0;
            }
        };
        self.last_error = None;

        let fresh = exclude_ids(
            fetched.items,
            live.get(MembershipKind::Viewed),
            live.get(MembershipKind::Blocked),
            live.get(MembershipKind::Archived),
        );
        let state = self.tab_mut(tab);
        state.page = fetched.page;
        state.has_more = fetched.has_more;
        let mut appended = 0;
        for lead in fresh {
            if !state.holds(lead.id) {
                state.candidates.push_back(lead);
                appended += 1;
            }
        }
        tracing::debug!(?tab, page = state.page, appended, has_more = state.has_more, "feed page loaded");
        appended
    }

    /// Loads page 1, then keeps loading while the queue is at or below the
    /// low-water mark and more pages exist.
    pub async fn fill(&mut self, tab: FeedTab, live: &MembershipSets) -> usize {
        let mut appended = self.load_page(tab, 1, live).await;
        for _ in 1..MAX_FILL_PAGES {
            let state = self.tab(tab);
            if state.candidates.len() > self.low_water_mark
                || !state.has_more
                || self.last_error.is_some()
            {
                break;
            }
            let next = state.page.saturating_add(1);
            appended += self.load_page(tab, next, live).await;
        }
        appended
    }

    /// Removes `lead_id` from `tab` and loads the next page if the queue is
    /// now at or below the low-water mark.
    pub async fn consume(&mut self, tab: FeedTab, lead_id: LeadId, live: &MembershipSets) -> Consumed {
        let low_water_mark = self.low_water_mark;
        let state = self.tab_mut(tab);
        let removed = match state.candidates.iter().position(|lead| lead.id == lead_id) {
            Some(index) => state.candidates.remove(index).is_some(),
            None => false,
        };

        let mut fetched = 0;
        if state.candidates.len() <= low_water_mark && state.has_more && !state.loading {
            let next = state.page.saturating_add(1);
            fetched = self.load_page(tab, next, live).await;
        }
        Consumed { removed, fetched }
    }

    /// Drops `lead_id` from both tabs without triggering a load.
    pub fn discard(&mut self, lead_id: LeadId) {
        self.all.candidates.retain(|lead| lead.id != lead_id);
        self.groups.candidates.retain(|lead| lead.id != lead_id);
    }

    /// Drops every queued lead that `live` now excludes, on both tabs.
    /// Returns how many were dropped.
    pub fn prune(&mut self, live: &MembershipSets) -> usize {
        let excluded = live.feed_exclusions();
        let mut dropped = 0;
        for state in [&mut self.all, &mut self.groups] {
            let before = state.candidates.len();
            state.candidates.retain(|lead| !excluded.contains(&lead.id));
            dropped += before - state.candidates.len();
        }
        dropped
    }

    /// Puts a restored lead at the back of the tab it belongs to. Returns
    /// that tab.
    pub fn requeue(&mut self, lead: Lead) -> FeedTab {
        let tab = if lead.in_groups(&self.group_ids) {
            FeedTab::Groups
        } else {
            FeedTab::All
        };
        self.snapshot.retain(|id| *id != lead.id);
        let state = self.tab_mut(tab);
        if !state.holds(lead.id) {
            state.candidates.push_back(lead);
        }
        tab
    }

    /// Replaces the group scope and empties the `groups` tab.
    pub fn set_group_ids(&mut self, group_ids: Vec<String>) {
        self.group_ids = group_ids;
        self.groups = TabState::default();
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{InMemoryStore, Store, StoreError, StoreOp};

    async fn fixture(n: i64, page_size: u32) -> (Arc<InMemoryStore>, FeedController) {
        let store = Arc::new(InMemoryStore::new());
        for id in 1..=n {
            let mut lead = Lead::new(LeadId::new(id), format!("lead {id}"));
            if id % 3 == 0 {
                lead.group_id = Some("g1".to_string());
            }
            store.insert_lead(lead).await;
        }
        let leads = LeadService::new(Store::from_adapter(Arc::clone(&store)));
        let feed = FeedController::new(
            leads,
            &MembershipSets::new(),
            vec!["g1".to_string()],
            page_size,
            3,
        );
        (store, feed)
    }

    fn head(feed: &FeedController, tab: FeedTab) -> Option<i64> {
        feed.current_candidate(tab).lead().map(|l| l.id.get())
    }

    #[test]
    fn exclude_ids_removes_all_three_kinds() {
        let leads: Vec<Lead> = (1..=5).map(|i| Lead::new(LeadId::new(i), "x")).collect();
        let viewed = HashSet::from([LeadId::new(1)]);
        let blocked = HashSet::from([LeadId::new(2)]);
        let archived = HashSet::from([LeadId::new(3)]);

        let kept = exclude_ids(leads, &viewed, &blocked, &archived);
        let ids: Vec<i64> = kept.iter().map(|l| l.id.get()).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[tokio::test]
    async fn load_appends_and_tracks_has_more() {
        let (_, mut feed) = fixture(15, 10).await;
        let live = MembershipSets::new();

        assert_eq!(feed.load_page(FeedTab::All, 1, &live).await, 10);
        assert!(feed.status(FeedTab::All).has_more);
        assert_eq!(head(&feed, FeedTab::All), Some(1));

        assert_eq!(feed.load_page(FeedTab::All, 2, &live).await, 5);
        assert!(!feed.status(FeedTab::All).has_more);

        // Reloading a page never duplicates queued leads.
        assert_eq!(feed.load_page(FeedTab::All, 2, &live).await, 0);
    }

    #[tokio::test]
    async fn live_exclusions_filter_fetched_pages() {
        let (_, mut feed) = fixture(5, 10).await;
        let mut live = MembershipSets::new();
        live.insert(MembershipKind::Viewed, LeadId::new(1));
        live.insert(MembershipKind::Blocked, LeadId::new(2));

        assert_eq!(feed.load_page(FeedTab::All, 1, &live).await, 3);
        assert_eq!(head(&feed, FeedTab::All), Some(3));
    }

    #[tokio::test]
    async fn groups_tab_is_scoped() {
        let (_, mut feed) = fixture(15, 10).await;
        let live = MembershipSets::new();
        assert_eq!(feed.load_page(FeedTab::Groups, 1, &live).await, 5);
        assert!(
            feed.candidates(FeedTab::Groups)
                .all(|l| l.group_id.as_deref() == Some("g1"))
        );
    }

    #[tokio::test]
    async fn consuming_near_low_water_fetches_next_page() {
        let (_, mut feed) = fixture(4, 2).await;
        let live = MembershipSets::new();
        assert_eq!(feed.load_page(FeedTab::All, 1, &live).await, 2);
        assert!(feed.status(FeedTab::All).has_more);

        let consumed = feed.consume(FeedTab::All, LeadId::new(1), &live).await;
        assert!(consumed.removed);
        assert_eq!(consumed.fetched, 2);
        assert_eq!(feed.status(FeedTab::All).remaining, 3);
        assert_eq!(feed.status(FeedTab::All).page, 2);
    }

    #[tokio::test]
    async fn exhausted_and_pending_sentinels() {
        let (_, mut feed) = fixture(2, 1).await;
        let live = MembershipSets::new();
        assert_eq!(feed.current_candidate(FeedTab::All), Candidate::Exhausted);

        feed.load_page(FeedTab::All, 1, &live).await;
        // Remove without going through consume so no refill happens.
        feed.discard(LeadId::new(1));
        assert_eq!(feed.current_candidate(FeedTab::All), Candidate::Pending);

        feed.load_page(FeedTab::All, 2, &live).await;
        let consumed = feed.consume(FeedTab::All, LeadId::new(2), &live).await;
        assert_eq!(consumed.fetched, 0);
        assert_eq!(feed.current_candidate(FeedTab::All), Candidate::Exhausted);
    }

    #[tokio::test]
    async fn failed_load_keeps_queue_and_sets_error() {
        let (store, mut feed) = fixture(5, 2).await;
        let live = MembershipSets::new();
        feed.load_page(FeedTab::All, 1, &live).await;

        store
            .inject_failure(StoreOp::FetchLeads, StoreError::Connection("down".into()))
            .await;
        assert_eq!(feed.load_page(FeedTab::All, 2, &live).await, 0);
        assert!(feed.last_error().is_some());
        assert_eq!(feed.status(FeedTab::All).remaining, 2);
        assert!(!feed.status(FeedTab::All).loading);

        store.clear_failures().await;
        assert_eq!(feed.load_page(FeedTab::All, 2, &live).await, 2);
        assert!(feed.last_error().is_none());
    }

    #[tokio::test]
    async fn page_past_end_serves_last_page() {
        let (_, mut feed) = fixture(5, 2).await;
        let live = MembershipSets::new();
        assert_eq!(feed.load_page(FeedTab::All, 9, &live).await, 1);
        assert_eq!(feed.status(FeedTab::All).page, 3);
        assert_eq!(head(&feed, FeedTab::All), Some(5));
    }

    #[tokio::test]
    async fn fill_loads_past_low_water() {
        let (_, mut feed) = fixture(10, 2).await;
        let live = MembershipSets::new();
        assert_eq!(feed.fill(FeedTab::All, &live).await, 4);
        assert_eq!(feed.status(FeedTab::All).page, 2);
    }

    #[tokio::test]
    async fn prune_drops_excluded_leads_from_both_tabs() {
        let (_, mut feed) = fixture(6, 10).await;
        let mut live = MembershipSets::new();
        feed.load_page(FeedTab::All, 1, &live).await;
        feed.load_page(FeedTab::Groups, 1, &live).await;
        assert_eq!(head(&feed, FeedTab::Groups), Some(3));

        live.insert(MembershipKind::Viewed, LeadId::new(3));
        live.insert(MembershipKind::Blocked, LeadId::new(1));
        live.insert(MembershipKind::Saved, LeadId::new(2));
        assert_eq!(feed.prune(&live), 3);

        let all: Vec<i64> = feed.candidates(FeedTab::All).map(|l| l.id.get()).collect();
        assert_eq!(all, vec![2, 4, 5, 6]);
        assert_eq!(head(&feed, FeedTab::Groups), Some(6));
    }

    #[tokio::test]
    async fn requeue_picks_tab_by_group() {
        let (_, mut feed) = fixture(0, 10).await;
        let mut grouped = Lead::new(LeadId::new(30), "g");
        grouped.group_id = Some("g1".to_string());
        assert_eq!(feed.requeue(grouped), FeedTab::Groups);
        assert_eq!(feed.requeue(Lead::new(LeadId::new(31), "a")), FeedTab::All);
        assert_eq!(head(&feed, FeedTab::All), Some(31));
    }

    #[test]
    fn snapshot_is_taken_at_construction() {
        let mut sets = MembershipSets::new();
        sets.insert(MembershipKind::Archived, LeadId::new(2));
        sets.insert(MembershipKind::Matched, LeadId::new(3));
        let leads = LeadService::new(Store::from_adapter(Arc::new(InMemoryStore::new())));
        let feed = FeedController::new(leads, &sets, Vec::new(), 10, 3);
        assert_eq!(feed.snapshot, vec![LeadId::new(2)]);
    }
}
