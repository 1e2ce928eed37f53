//! Database row types and their conversion into domain types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    FacebookGroup, Lead, LeadId, MembershipKind, MembershipRecord, Notification,
    NotificationKind, Theme, UserId, UserProfile, UserSettings,
};

/// A row from the `leads` table.
#[derive(Debug, Clone, FromRow)]
pub struct LeadRow {
    /// Lead id.
    pub id: i64,
    /// Scraped name.
    pub name: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Job title.
    pub position: String,
    /// Location.
    pub location: String,
    /// Description.
    pub description: String,
    /// Company size bucket.
    pub employees: String,
    /// Industry.
    pub industry: String,
    /// Tags (`TEXT[]`).
    pub tags: Vec<String>,
    /// Profile picture URL.
    pub image_url: String,
    /// Company logo URL.
    pub logo_url: String,
    /// E-mail.
    pub email: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Source post id.
    pub post_id: Option<String>,
    /// Source post text.
    pub post_text: Option<String>,
    /// Source post author.
    pub post_author: Option<String>,
    /// Source post author id.
    pub post_author_id: Option<String>,
    /// Source comment id.
    pub comment_id: Option<String>,
    /// Source comment text.
    pub comment_text: Option<String>,
    /// Source comment author.
    pub comment_author_name: Option<String>,
    /// Source comment author id.
    pub comment_author_id: Option<String>,
    /// Source comment permalink.
    pub comment_url: Option<String>,
    /// Source group id.
    pub group_id: Option<String>,
    /// Source group name.
    pub group_name: Option<String>,
    /// Source activity time.
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<LeadRow> for Lead {
    fn from(row: LeadRow) -> Self {
        Self {
            id: LeadId::new(row.id),
            name: row.name,
            first_name: row.first_name,
            last_name: row.last_name,
            position: row.position,
            location: row.location,
            description: row.description,
            employees: row.employees,
            industry: row.industry,
            tags: row.tags,
            image_url: row.image_url,
            logo_url: row.logo_url,
            email: row.email,
            phone: row.phone,
            post_id: row.post_id,
            post_text: row.post_text,
            post_author: row.post_author,
            post_author_id: row.post_author_id,
            comment_id: row.comment_id,
            comment_text: row.comment_text,
            comment_author_name: row.comment_author_name,
            comment_author_id: row.comment_author_id,
            comment_url: row.comment_url,
            group_id: row.group_id,
            group_name: row.group_name,
            timestamp: row.timestamp,
        }
    }
}

/// A row from any membership table.
#[derive(Debug, Clone, FromRow)]
pub struct MembershipRow {
    /// Owning user.
    pub user_id: Uuid,
    /// Lead id.
    pub lead_id: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Block reason; always `NULL` outside `blocked_leads`.
    pub reason: Option<String>,
}

impl MembershipRow {
    /// Converts into a record of `kind`.
    #[must_use]
    pub fn into_record(self, kind: MembershipKind) -> MembershipRecord {
        MembershipRecord {
            user_id: UserId::from_uuid(self.user_id),
            lead_id: LeadId::new(self.lead_id),
            kind,
            created_at: self.created_at,
            reason: self.reason,
        }
    }
}

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    /// Row id.
    pub id: i64,
    /// Recipient.
    pub user_id: Uuid,
    /// Category label.
    pub kind: String,
    /// Headline.
    pub title: String,
    /// Body.
    pub message: String,
    /// Related lead.
    pub lead_id: Option<i64>,
    /// Read flag.
    pub is_read: bool,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// In-app link.
    pub action_url: Option<String>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            kind: NotificationKind::from_label(&row.kind),
            title: row.title,
            message: row.message,
            lead_id: row.lead_id.map(LeadId::new),
            is_read: row.is_read,
            created_at: row.created_at,
            action_url: row.action_url,
        }
    }
}

/// A row from the `facebook_groups` table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    /// Row id.
    pub id: i64,
    /// Owning user.
    pub user_id: Uuid,
    /// Facebook group id.
    pub group_id: String,
    /// Display name.
    pub group_name: String,
    /// Group URL.
    pub group_url: String,
    /// Link time.
    pub created_at: DateTime<Utc>,
}

impl From<GroupRow> for FacebookGroup {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            group_id: row.group_id,
            group_name: row.group_name,
            group_url: row.group_url,
            created_at: row.created_at,
        }
    }
}

/// A row from the `user_settings` table.
#[derive(Debug, Clone, FromRow)]
pub struct SettingsRow {
    /// Owning user.
    pub user_id: Uuid,
    /// Keyword filter.
    pub keywords: Vec<String>,
    /// E-mail notifications flag.
    pub notification_email: bool,
    /// Push notifications flag.
    pub notification_push: bool,
    /// Theme label.
    pub theme: String,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl From<SettingsRow> for UserSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            keywords: row.keywords,
            notification_email: row.notification_email,
            notification_push: row.notification_push,
            theme: row.theme.parse::<Theme>().unwrap_or_default(),
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `profiles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    /// Owning user.
    pub user_id: Uuid,
    /// Account e-mail.
    pub email: String,
    /// Display name.
    pub full_name: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// First write time.
    pub created_at: DateTime<Utc>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            email: row.email,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
