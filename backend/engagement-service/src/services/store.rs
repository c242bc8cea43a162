/// User store seam
///
/// Candidate listing, single-user fetch, preference updates, and the atomic
/// batch commit of staged engagement updates. The production implementation
/// runs on PostgreSQL; tests substitute an in-memory fake.
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{EngagementUpdate, NotificationPreferences, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users whose last engagement day stamp is absent or differs from
    /// `today`. Never-notified users are candidates.
    async fn list_candidates(&self, today: NaiveDate) -> Result<Vec<User>>;

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Set only the `daily` key of the preference map. The rest of the map is
    /// written concurrently by the surrounding application and must not be
    /// round-tripped through this service.
    async fn set_daily_preference(&self, user_id: Uuid, enabled: bool) -> Result<bool>;

    /// Apply all staged updates as one unit: each user gets the day stamp and
    /// a counter increment, all of them or none.
    async fn commit_engagement_updates(&self, updates: &[EngagementUpdate]) -> Result<()>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    fcm_token: Option<String>,
    notification_preferences: sqlx::types::Json<NotificationPreferences>,
    last_engagement_notification: Option<NaiveDate>,
    engagement_notifications_count: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            fcm_token: row.fcm_token,
            notification_preferences: row.notification_preferences.0,
            last_engagement_notification: row.last_engagement_notification,
            engagement_notifications_count: row.engagement_notifications_count,
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list_candidates(&self, today: NaiveDate) -> Result<Vec<User>> {
        let query = r#"
            SELECT id, fcm_token, notification_preferences,
                   last_engagement_notification, engagement_notifications_count
            FROM users
            WHERE last_engagement_notification IS NULL
               OR last_engagement_notification <> $1
        "#;

        let rows: Vec<UserRow> = sqlx::query_as(query).bind(today).fetch_all(&self.db).await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let query = r#"
            SELECT id, fcm_token, notification_preferences,
                   last_engagement_notification, engagement_notifications_count
            FROM users
            WHERE id = $1
        "#;

        let row: Option<UserRow> = sqlx::query_as(query)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(User::from))
    }

    async fn set_daily_preference(&self, user_id: Uuid, enabled: bool) -> Result<bool> {
        let query = r#"
            UPDATE users
            SET notification_preferences =
                    notification_preferences || jsonb_build_object('daily', $1::boolean),
                updated_at = now()
            WHERE id = $2
        "#;

        let result = sqlx::query(query)
            .bind(enabled)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit_engagement_updates(&self, updates: &[EngagementUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let query = r#"
            UPDATE users
            SET last_engagement_notification = $1,
                engagement_notifications_count = engagement_notifications_count + 1,
                updated_at = now()
            WHERE id = $2
        "#;

        let mut tx = self.db.begin().await?;
        for update in updates {
            sqlx::query(query)
                .bind(update.date)
                .bind(update.user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("Committed {} engagement updates", updates.len());
        Ok(())
    }
}
