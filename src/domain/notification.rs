//! In-app notifications and the outcome of enqueueing one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LeadId, UserId};

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The user matched a lead.
    NewMatch,
    /// New leads arrived from a linked group.
    NewLead,
    /// An outreach message was generated.
    MessageGenerated,
    /// A lead was saved.
    LeadSaved,
    /// Anything else.
    System,
}

impl NotificationKind {
    /// Storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewMatch => "new_match",
            Self::NewLead => "new_lead",
            Self::MessageGenerated => "message_generated",
            Self::LeadSaved => "lead_saved",
            Self::System => "system",
        }
    }

    /// Parses a storage label; unknown labels map to [`Self::System`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "new_match" => Self::NewMatch,
            "new_lead" => Self::NewLead,
            "message_generated" => Self::MessageGenerated,
            "lead_saved" => Self::LeadSaved,
            _ => Self::System,
        }
    }
}

/// A stored notification row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Row id.
    pub id: i64,
    /// Recipient.
    pub user_id: UserId,
    /// Category.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Related lead, if any.
    pub lead_id: Option<LeadId>,
    /// Whether the user has read it.
    pub is_read: bool,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// In-app link to follow.
    pub action_url: Option<String>,
}

/// A notification that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Category.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Related lead, if any.
    pub lead_id: Option<LeadId>,
    /// In-app link to follow.
    pub action_url: Option<String>,
}

impl NewNotification {
    /// The notification enqueued when `user_id` matches a lead.
    #[must_use]
    pub fn new_match(user_id: UserId, lead_id: LeadId, lead_name: &str) -> Self {
        Self {
            user_id,
            kind: NotificationKind::NewMatch,
            title: "New Match!".to_string(),
            message: format!("You matched with {lead_name}. Start a conversation now!"),
            lead_id: Some(lead_id),
            action_url: Some("/".to_string()),
        }
    }
}

/// Result of a best-effort notification enqueue.
///
/// Callers decide what to do with a deferred notification; nothing is
/// stashed on their behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Stored and published to live subscribers.
    Delivered {
        /// The stored row.
        notification: Notification,
    },
    /// Rejected by a store permission policy; may succeed if retried later.
    Deferred {
        /// The notification that was not stored.
        notification: NewNotification,
        /// Why it was rejected.
        reason: String,
    },
    /// Will not be delivered.
    Dropped {
        /// Why it was dropped.
        reason: String,
    },
}

impl DeliveryOutcome {
    /// Returns `true` for [`DeliveryOutcome::Delivered`].
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Status label used in logs.
    #[must_use]
    pub const fn status_str(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Deferred { .. } => "deferred",
            Self::Dropped { .. } => "dropped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_round_trip() {
        for kind in [
            NotificationKind::NewMatch,
            NotificationKind::NewLead,
            NotificationKind::MessageGenerated,
            NotificationKind::LeadSaved,
            NotificationKind::System,
        ] {
            assert_eq!(NotificationKind::from_label(kind.as_str()), kind);
        }
        assert_eq!(NotificationKind::from_label("weird"), NotificationKind::System);
    }

    #[test]
    fn new_match_message() {
        let n = NewNotification::new_match(UserId::new(), LeadId::new(3), "Jane Doe");
        assert_eq!(n.title, "New Match!");
        assert_eq!(
            n.message,
            "You matched with Jane Doe. Start a conversation now!"
        );
        assert_eq!(n.lead_id, Some(LeadId::new(3)));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = DeliveryOutcome::Dropped {
            reason: "no session".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap_or_default();
        assert!(json.contains("\"status\":\"dropped\""));
        assert!(!outcome.is_delivered());
    }
}
