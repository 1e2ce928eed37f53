//! PostgreSQL adapter for every store port.
//!
//! Lead predicates are assembled with [`QueryBuilder`] so the count and the
//! range fetch share one filter. Membership writes rely on the tables'
//! primary keys plus `ON CONFLICT DO NOTHING` for insert-or-ignore.
//! Passwords are checked with pgcrypto's `crypt()`.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::{GroupRow, LeadRow, MembershipRow, NotificationRow, ProfileRow, SettingsRow};
use super::{
    AuthProvider, GroupRepository, LeadQuery, LeadRepository, MembershipRepository,
    NotificationRepository, ProfileRepository, SettingsRepository, StoreError,
};
use crate::config::DatabaseConfig;
use crate::domain::{
    AuthUser, FacebookGroup, Lead, LeadId, MembershipKind, MembershipRecord, NewGroup,
    NewNotification, Notification, SessionToken, UserId, UserProfile, UserSettings,
};
use crate::query::SEARCH_FIELDS;

const LEAD_COLUMNS: &str = "id, name, first_name, last_name, position, location, description, \
     employees, industry, tags, image_url, logo_url, email, phone, post_id, post_text, \
     post_author, post_author_id, comment_id, comment_text, comment_author_name, \
     comment_author_id, comment_url, group_id, group_name, timestamp";

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, kind, title, message, lead_id, is_read, created_at, action_url";

/// Maps a `sqlx` error onto the port error taxonomy.
fn map_sqlx(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("42501") => StoreError::PermissionDenied(db.message().to_string()),
            Some("23505") => StoreError::Conflict(db.message().to_string()),
            _ => StoreError::Query(err.to_string()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Connection(err.to_string())
        }
        _ => StoreError::Query(err.to_string()),
    }
}

/// Escapes `LIKE` wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_lead_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &LeadQuery) {
    builder.push(" WHERE TRUE");
    if let Some(ids) = &query.include_ids {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        builder.push(" AND id = ANY(").push_bind(ids).push(")");
    }
    if !query.exclude_ids.is_empty() {
        let ids: Vec<i64> = query.exclude_ids.iter().map(|id| id.get()).collect();
        builder.push(" AND NOT (id = ANY(").push_bind(ids).push("))");
    }
    if let Some(groups) = &query.group_ids {
        builder
            .push(" AND group_id = ANY(")
            .push_bind(groups.clone())
            .push(")");
    }
    if let Some(group_id) = &query.group_id {
        builder.push(" AND group_id = ").push_bind(group_id.clone());
    }
    if let Some(term) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = like_pattern(term);
        builder.push(" AND (");
        let mut columns = builder.separated(" OR ");
        for column in SEARCH_FIELDS {
            columns
                .push(format!("{column} ILIKE "))
                .push_bind_unseparated(pattern.clone());
        }
        builder.push(")");
    }
}

/// PostgreSQL-backed implementation of every store port.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool with `config` and runs the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the database is unreachable or
    /// a migration fails.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(
            max_connections = config.max_connections,
            "postgres store ready"
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl LeadRepository for PostgresStore {
    async fn count_leads(&self, query: &LeadQuery) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
        push_lead_filters(&mut builder, query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn fetch_leads(
        &self,
        query: &LeadQuery,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Lead>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {LEAD_COLUMNS} FROM leads"));
        push_lead_filters(&mut builder, query);
        builder
            .push(" ORDER BY id ASC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
        let rows = builder
            .build_query_as::<LeadRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Lead::from).collect())
    }

    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, StoreError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Lead::from))
    }
}

#[async_trait]
impl MembershipRepository for PostgresStore {
    async fn membership_ids(
        &self,
        user_id: UserId,
        kind: MembershipKind,
    ) -> Result<Vec<LeadId>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT lead_id FROM {} WHERE user_id = $1",
            kind.table_name()
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(ids.into_iter().map(LeadId::new).collect())
    }

    async fn insert_membership(&self, record: &MembershipRecord) -> Result<bool, StoreError> {
        let result = if record.kind == MembershipKind::Blocked {
            sqlx::query(
                "INSERT INTO blocked_leads (user_id, lead_id, created_at, reason) \
                 VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
            )
            .bind(record.user_id.as_uuid())
            .bind(record.lead_id.get())
            .bind(record.created_at)
            .bind(record.reason.as_deref())
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(&format!(
                "INSERT INTO {} (user_id, lead_id, created_at) VALUES ($1, $2, $3) \
                 ON CONFLICT DO NOTHING",
                record.kind.table_name()
            ))
            .bind(record.user_id.as_uuid())
            .bind(record.lead_id.get())
            .bind(record.created_at)
            .execute(&self.pool)
            .await
        }
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_membership(
        &self,
        user_id: UserId,
        lead_id: LeadId,
        kind: MembershipKind,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND lead_id = $2",
            kind.table_name()
        ))
        .bind(user_id.as_uuid())
        .bind(lead_id.get())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_memberships(
        &self,
        user_id: UserId,
        kind: MembershipKind,
    ) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = $1",
            kind.table_name()
        ))
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn blocked_records(&self, user_id: UserId) -> Result<Vec<MembershipRecord>, StoreError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            "SELECT user_id, lead_id, created_at, reason FROM blocked_leads \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_record(MembershipKind::Blocked))
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for PostgresStore {
    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, StoreError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "INSERT INTO notifications (user_id, kind, title, message, lead_id, action_url) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(notification.user_id.as_uuid())
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.lead_id.map(LeadId::get))
        .bind(notification.action_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.into())
    }

    async fn notifications_for(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(user_id.as_uuid())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn count_unread(&self, user_id: UserId) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn mark_read(&self, user_id: UserId, id: i64) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, user_id: UserId, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl GroupRepository for PostgresStore {
    async fn groups_for(&self, user_id: UserId) -> Result<Vec<FacebookGroup>, StoreError> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT id, user_id, group_id, group_name, group_url, created_at \
             FROM facebook_groups WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(FacebookGroup::from).collect())
    }

    async fn insert_group(
        &self,
        user_id: UserId,
        group: &NewGroup,
        limit: usize,
    ) -> Result<Option<FacebookGroup>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Serializes concurrent inserts for one user so the count holds.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        let row = sqlx::query_as::<_, GroupRow>(
            "INSERT INTO facebook_groups (user_id, group_id, group_name, group_url) \
             SELECT $1, $2, $3, $4 \
             WHERE (SELECT COUNT(*) FROM facebook_groups WHERE user_id = $1) < $5 \
             RETURNING id, user_id, group_id, group_name, group_url, created_at",
        )
        .bind(user_id.as_uuid())
        .bind(&group.group_id)
        .bind(&group.group_name)
        .bind(&group.group_url)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(row.map(FacebookGroup::from))
    }

    async fn delete_group(&self, user_id: UserId, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM facebook_groups WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SettingsRepository for PostgresStore {
    async fn settings_for(&self, user_id: UserId) -> Result<Option<UserSettings>, StoreError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT user_id, keywords, notification_email, notification_push, theme, updated_at \
             FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(UserSettings::from))
    }

    async fn upsert_settings(&self, settings: &UserSettings) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_settings \
             (user_id, keywords, notification_email, notification_push, theme, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id) DO UPDATE SET keywords = EXCLUDED.keywords, \
             notification_email = EXCLUDED.notification_email, \
             notification_push = EXCLUDED.notification_push, \
             theme = EXCLUDED.theme, updated_at = EXCLUDED.updated_at",
        )
        .bind(settings.user_id.as_uuid())
        .bind(&settings.keywords)
        .bind(settings.notification_email)
        .bind(settings.notification_push)
        .bind(settings.theme.as_str())
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for PostgresStore {
    async fn profile_for(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, email, full_name, avatar_url, created_at, updated_at \
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(UserProfile::from))
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "INSERT INTO profiles (user_id, email, full_name, avatar_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id) DO UPDATE SET email = EXCLUDED.email, \
             full_name = EXCLUDED.full_name, avatar_url = EXCLUDED.avatar_url, \
             updated_at = EXCLUDED.updated_at \
             RETURNING user_id, email, full_name, avatar_url, created_at, updated_at",
        )
        .bind(profile.user_id.as_uuid())
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.avatar_url)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.into())
    }
}

#[async_trait]
impl AuthProvider for PostgresStore {
    async fn current_user(&self, token: &SessionToken) -> Result<Option<AuthUser>, StoreError> {
        let row = sqlx::query_as::<_, (uuid::Uuid, String)>(
            "SELECT u.id, u.email FROM auth_sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token = $1",
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(|(id, email)| AuthUser {
            id: UserId::from_uuid(id),
            email,
        }))
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<(AuthUser, SessionToken)>, StoreError> {
        let row = sqlx::query_as::<_, (uuid::Uuid, String)>(
            "SELECT id, email FROM users \
             WHERE lower(email) = lower($1) AND password_hash = crypt($2, password_hash)",
        )
        .bind(email)
        .bind(password)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let Some((id, email)) = row else {
            return Ok(None);
        };

        let token = SessionToken::generate();
        sqlx::query("INSERT INTO auth_sessions (token, user_id) VALUES ($1, $2)")
            .bind(token.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(Some((
            AuthUser {
                id: UserId::from_uuid(id),
                email,
            },
            token,
        )))
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn every_membership_table_cascades() {
        const SCHEMA: &str = include_str!("../../migrations/20260101000000_init.sql");
        for kind in MembershipKind::ALL {
            let header = format!("CREATE TABLE IF NOT EXISTS {} (", kind.table_name());
            let Some(start) = SCHEMA.find(&header) else {
                panic!("no explicit definition for {}", kind.table_name());
            };
            let body = SCHEMA.get(start..).and_then(|rest| rest.split(");").next());
            let Some(body) = body else {
                panic!("unterminated definition for {}", kind.table_name());
            };
            assert!(body.contains("REFERENCES users (id) ON DELETE CASCADE"), "{kind:?}");
            assert!(body.contains("REFERENCES leads (id) ON DELETE CASCADE"), "{kind:?}");
            assert!(body.contains("PRIMARY KEY (user_id, lead_id)"), "{kind:?}");
        }
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("acme"), "%acme%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn filters_render_expected_sql() {
        let query = LeadQuery {
            include_ids: Some(vec![LeadId::new(1)]),
            exclude_ids: vec![LeadId::new(2)],
            group_ids: None,
            group_id: Some("g1".to_string()),
            search: Some("acme".to_string()),
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
        push_lead_filters(&mut builder, &query);
        let sql = builder.sql();

        assert!(sql.contains("id = ANY($1)"));
        assert!(sql.contains("NOT (id = ANY($2))"));
        assert!(sql.contains("group_id = $3"));
        assert!(sql.contains("name ILIKE $4 OR first_name ILIKE $5"));
        assert!(sql.contains("comment_text ILIKE $10)"));
    }

    #[test]
    fn blank_search_adds_no_predicate() {
        let query = LeadQuery {
            search: Some("  ".to_string()),
            ..LeadQuery::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
        push_lead_filters(&mut builder, &query);
        assert!(!builder.sql().contains("ILIKE"));
    }
}
