//! Lead list service: paginated views, blocked entries and stats.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{BlockedLead, Lead, LeadId, LeadStats, MembershipKind, UserId};
use crate::error::LeadSwipeError;
use crate::query::{LeadFilter, Page, PageRequest, SortSpec, apply_keywords, sort_leads};
use crate::store::{LeadQuery, Store};

/// Which leads a list shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListView {
    /// Every lead.
    #[default]
    All,
    /// The user's matches.
    Matched,
    /// The user's archive.
    Archived,
    /// Leads the user blocked.
    Blocked,
    /// Leads the user saved.
    Saved,
}

impl ListView {
    /// The membership kind that constrains this view, if any.
    #[must_use]
    pub const fn membership(self) -> Option<MembershipKind> {
        match self {
            Self::All => None,
            Self::Matched => Some(MembershipKind::Matched),
            Self::Archived => Some(MembershipKind::Archived),
            Self::Blocked => Some(MembershipKind::Blocked),
            Self::Saved => Some(MembershipKind::Saved),
        }
    }
}

impl FromStr for ListView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "matched" => Ok(Self::Matched),
            "archived" => Ok(Self::Archived),
            "blocked" => Ok(Self::Blocked),
            "saved" => Ok(Self::Saved),
            other => Err(format!("unknown list view: {other}")),
        }
    }
}

/// Read-side orchestration over the lead and membership ports.
#[derive(Debug, Clone)]
pub struct LeadService {
    store: Store,
}

impl LeadService {
    /// Creates a new `LeadService`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Counts, clamps and fetches one page of `query`.
    ///
    /// A page past the end is served as the last page.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] if the count or fetch fails.
    pub async fn query_page(
        &self,
        query: &LeadQuery,
        request: PageRequest,
    ) -> Result<Page<Lead>, LeadSwipeError> {
        let request = request.clamped();
        let total = self.store.leads.count_leads(query).await?;
        if total == 0 {
            return Ok(Page::empty(request));
        }
        let offset = request.resolve_offset(total);
        let items = self
            .store
            .leads
            .fetch_leads(query, offset, request.page_size)
            .await?;
        let page = Page::from_offset(items, offset, request.page_size, total);
        tracing::debug!(
            total,
            page = page.page,
            rows = page.items.len(),
            "lead page fetched"
        );
        Ok(page)
    }

    /// One page of `view` for `user_id`.
    ///
    /// Membership views with no members return an empty page without
    /// querying leads. Keywords are applied to the fetched rows, then the
    /// rows are sorted.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn list(
        &self,
        user_id: UserId,
        view: ListView,
        request: PageRequest,
        filter: &LeadFilter,
        sort: Option<SortSpec>,
    ) -> Result<Page<Lead>, LeadSwipeError> {
        let include_ids = match view.membership() {
            Some(kind) => {
                let ids = self.store.memberships.membership_ids(user_id, kind).await?;
                if ids.is_empty() {
                    return Ok(Page::empty(request.clamped()));
                }
                Some(ids)
            }
            None => None,
        };

        let query = LeadQuery {
            include_ids,
            search: filter.search_term().map(str::to_string),
            group_id: filter
                .group_id
                .as_deref()
                .filter(|g| !g.is_empty())
                .map(str::to_string),
            ..LeadQuery::default()
        };

        let mut page = self.query_page(&query, request).await?;
        page.items = apply_keywords(page.items, &filter.active_keywords());
        if let Some(spec) = sort {
            sort_leads(&mut page.items, spec);
        }
        Ok(page)
    }

    /// Fetches one lead.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::LeadNotFound`] if it does not exist.
    pub async fn get_lead(&self, id: LeadId) -> Result<Lead, LeadSwipeError> {
        self.store
            .leads
            .get_lead(id)
            .await?
            .ok_or(LeadSwipeError::LeadNotFound(id))
    }

    /// Blocked records joined with their leads, newest first.
    ///
    /// Records whose lead no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn blocked_entries(&self, user_id: UserId) -> Result<Vec<BlockedLead>, LeadSwipeError> {
        let records = self.store.memberships.blocked_records(user_id).await?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let Some(lead) = self.store.leads.get_lead(record.lead_id).await? else {
                tracing::debug!(lead_id = %record.lead_id, "blocked lead no longer exists");
                continue;
            };
            entries.push(BlockedLead {
                lead_id: record.lead_id,
                blocked_at: record.created_at,
                reason: record.reason,
                lead,
            });
        }
        Ok(entries)
    }

    /// Dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Store`] on store failure.
    pub async fn stats(&self, user_id: UserId) -> Result<LeadStats, LeadSwipeError> {
        let memberships = &self.store.memberships;
        Ok(LeadStats {
            total_leads: self.store.leads.count_leads(&LeadQuery::default()).await?,
            archived_leads: memberships
                .count_memberships(user_id, MembershipKind::Archived)
                .await?,
            blocked_leads: memberships
                .count_memberships(user_id, MembershipKind::Blocked)
                .await?,
            matched_leads: memberships
                .count_memberships(user_id, MembershipKind::Matched)
                .await?,
            saved_leads: memberships
                .count_memberships(user_id, MembershipKind::Saved)
                .await?,
        })
    }
}
