//! Per-user membership sets: viewed, saved, matched, blocked, archived.
//!
//! Each kind is an independent `(user_id, lead_id)` relation. A lead may be
//! matched, archived and saved at the same time; only the feed treats
//! viewed/blocked/archived as exclusions.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Lead, LeadId, UserId};

/// The five membership relations a user can hold with a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    /// Lead was shown in the feed and decided on.
    Viewed,
    /// Lead was bookmarked.
    Saved,
    /// User swiped right / matched the lead.
    Matched,
    /// User never wants to see the lead again.
    Blocked,
    /// Lead was removed from the active feed.
    Archived,
}

impl MembershipKind {
    /// Every kind, in storage order.
    pub const ALL: [Self; 5] = [
        Self::Viewed,
        Self::Saved,
        Self::Matched,
        Self::Blocked,
        Self::Archived,
    ];

    /// Name of the backing join table.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Viewed => "viewed_leads",
            Self::Saved => "saved_leads",
            Self::Matched => "matched_leads",
            Self::Blocked => "blocked_leads",
            Self::Archived => "archived_leads",
        }
    }

    /// Lower-case label used in logs and query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewed => "viewed",
            Self::Saved => "saved",
            Self::Matched => "matched",
            Self::Blocked => "blocked",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown membership kind: {s}"))
    }
}

/// One row of a membership table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    /// Owning user.
    pub user_id: UserId,
    /// Lead the relation points at.
    pub lead_id: LeadId,
    /// Which relation this row belongs to.
    pub kind: MembershipKind,
    /// Creation time (`blocked_at` / `archived_at` for those kinds).
    pub created_at: DateTime<Utc>,
    /// Free-text reason. Only meaningful for [`MembershipKind::Blocked`].
    pub reason: Option<String>,
}

impl MembershipRecord {
    /// Builds a record stamped with the current time.
    #[must_use]
    pub fn new(user_id: UserId, lead_id: LeadId, kind: MembershipKind) -> Self {
        Self {
            user_id,
            lead_id,
            kind,
            created_at: Utc::now(),
            reason: None,
        }
    }

    /// Attaches a block reason. Blank reasons are dropped.
    #[must_use]
    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason.filter(|r| !r.trim().is_empty());
        self
    }
}

/// A blocked membership joined with the lead it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BlockedLead {
    /// Lead id.
    pub lead_id: LeadId,
    /// When the block was recorded.
    pub blocked_at: DateTime<Utc>,
    /// Optional reason supplied by the user.
    pub reason: Option<String>,
    /// The blocked lead.
    pub lead: Lead,
}

/// Locally cached membership ids for one user.
///
/// Mirrors the remote tables; updated only after a remote write succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSets {
    viewed: HashSet<LeadId>,
    saved: HashSet<LeadId>,
    matched: HashSet<LeadId>,
    blocked: HashSet<LeadId>,
    archived: HashSet<LeadId>,
}

impl MembershipSets {
    /// Creates empty sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set for `kind`.
    #[must_use]
    pub const fn get(&self, kind: MembershipKind) -> &HashSet<LeadId> {
        match kind {
            MembershipKind::Viewed => &self.viewed,
            MembershipKind::Saved => &self.saved,
            MembershipKind::Matched => &self.matched,
            MembershipKind::Blocked => &self.blocked,
            MembershipKind::Archived => &self.archived,
        }
    }

    fn get_mut(&mut self, kind: MembershipKind) -> &mut HashSet<LeadId> {
        match kind {
            MembershipKind::Viewed => &mut self.viewed,
            MembershipKind::Saved => &mut self.saved,
            MembershipKind::Matched => &mut self.matched,
            MembershipKind::Blocked => &mut self.blocked,
            MembershipKind::Archived => &mut self.archived,
        }
    }

    /// Replaces the whole set for `kind`.
    pub fn replace(&mut self, kind: MembershipKind, ids: impl IntoIterator<Item = LeadId>) {
        *self.get_mut(kind) = ids.into_iter().collect();
    }

    /// Returns `true` if `lead_id` is in the `kind` set.
    #[must_use]
    pub fn contains(&self, kind: MembershipKind, lead_id: LeadId) -> bool {
        self.get(kind).contains(&lead_id)
    }

    /// Adds `lead_id` to the `kind` set. Returns `false` if already present.
    pub fn insert(&mut self, kind: MembershipKind, lead_id: LeadId) -> bool {
        self.get_mut(kind).insert(lead_id)
    }

    /// Removes `lead_id` from the `kind` set. Returns `false` if absent.
    pub fn remove(&mut self, kind: MembershipKind, lead_id: LeadId) -> bool {
        self.get_mut(kind).remove(&lead_id)
    }

    /// Number of ids in the `kind` set.
    #[must_use]
    pub fn len(&self, kind: MembershipKind) -> usize {
        self.get(kind).len()
    }

    /// Union of the three feed exclusion sets (viewed, blocked, archived).
    #[must_use]
    pub fn feed_exclusions(&self) -> HashSet<LeadId> {
        self.viewed
            .iter()
            .chain(&self.blocked)
            .chain(&self.archived)
            .copied()
            .collect()
    }
}

/// Dashboard counters for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeadStats {
    /// All leads in the store.
    pub total_leads: u64,
    /// Leads the user archived.
    pub archived_leads: u64,
    /// Leads the user blocked.
    pub blocked_leads: u64,
    /// Leads the user matched.
    pub matched_leads: u64,
    /// Leads the user saved.
    pub saved_leads: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in MembershipKind::ALL {
            assert_eq!(kind.as_str().parse::<MembershipKind>(), Ok(kind));
        }
        assert!("liked".parse::<MembershipKind>().is_err());
    }

    #[test]
    fn sets_are_independent() {
        let mut sets = MembershipSets::new();
        let id = LeadId::new(7);
        assert!(sets.insert(MembershipKind::Matched, id));
        assert!(sets.insert(MembershipKind::Archived, id));
        assert!(!sets.insert(MembershipKind::Matched, id));

        assert!(sets.contains(MembershipKind::Matched, id));
        assert!(sets.contains(MembershipKind::Archived, id));
        assert!(!sets.contains(MembershipKind::Saved, id));

        assert!(sets.remove(MembershipKind::Matched, id));
        assert!(sets.contains(MembershipKind::Archived, id));
    }

    #[test]
    fn feed_exclusions_union() {
        let mut sets = MembershipSets::new();
        sets.replace(MembershipKind::Viewed, [LeadId::new(1), LeadId::new(2)]);
        sets.replace(MembershipKind::Blocked, [LeadId::new(2), LeadId::new(3)]);
        sets.replace(MembershipKind::Archived, [LeadId::new(4)]);
        sets.replace(MembershipKind::Matched, [LeadId::new(5)]);

        let excluded = sets.feed_exclusions();
        assert_eq!(excluded.len(), 4);
        assert!(!excluded.contains(&LeadId::new(5)));
    }

    #[test]
    fn blank_block_reason_is_dropped() {
        let record = MembershipRecord::new(UserId::new(), LeadId::new(1), MembershipKind::Blocked)
            .with_reason(Some("   ".to_string()));
        assert_eq!(record.reason, None);
    }
}
