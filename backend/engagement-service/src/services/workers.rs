/// Queue workers
///
/// Two interval-driven polling loops over durable queue tables written by the
/// surrounding application:
///
/// - `scheduled_notifications`: one-shot per-user notifications due at a
///   specific time; marked sent after delivery. Rows for unknown or
///   unreachable users are marked handled so they are not re-polled forever.
/// - `notification_requests`: raw token/title/body rows; deleted once
///   delivered, left in place on delivery failure for the next poll.
///
/// A poll-query error is logged and retried on the next tick; it never stops
/// the loop. Queue access goes through [`NotificationQueue`] so tests can
/// substitute an in-memory fake, same as [`UserStore`].
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::error::Result;
use crate::models::{NotificationRequest, ScheduledNotification};
use crate::services::push::PushSender;
use crate::services::store::UserStore;

/// Metadata type tag for queue-driven one-shot notifications.
pub const SCHEDULED_ENGAGEMENT_TYPE: &str = "scheduled_engagement";
/// Metadata type tag for raw notification requests.
pub const DIRECT_TYPE: &str = "direct";

#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Unsent scheduled notifications whose due time has passed, oldest first.
    async fn due_scheduled(&self, limit: i64) -> Result<Vec<ScheduledNotification>>;

    /// Mark a scheduled notification handled so it is never polled again.
    async fn mark_scheduled_sent(&self, id: Uuid) -> Result<()>;

    /// Pending raw delivery requests, oldest first.
    async fn pending_requests(&self, limit: i64) -> Result<Vec<NotificationRequest>>;

    async fn delete_request(&self, id: Uuid) -> Result<()>;
}

pub struct PgNotificationQueue {
    db: PgPool,
}

impl PgNotificationQueue {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduledRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    body: String,
    scheduled_at: DateTime<Utc>,
    sent: bool,
    sent_at: Option<DateTime<Utc>>,
}

impl From<ScheduledRow> for ScheduledNotification {
    fn from(row: ScheduledRow) -> Self {
        ScheduledNotification {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            body: row.body,
            scheduled_at: row.scheduled_at,
            sent: row.sent,
            sent_at: row.sent_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    receiver_token: String,
    title: String,
    body: String,
}

impl From<RequestRow> for NotificationRequest {
    fn from(row: RequestRow) -> Self {
        NotificationRequest {
            id: row.id,
            receiver_token: row.receiver_token,
            title: row.title,
            body: row.body,
        }
    }
}

#[async_trait]
impl NotificationQueue for PgNotificationQueue {
    async fn due_scheduled(&self, limit: i64) -> Result<Vec<ScheduledNotification>> {
        let query = r#"
            SELECT id, user_id, title, body, scheduled_at, sent, sent_at
            FROM scheduled_notifications
            WHERE sent = FALSE AND scheduled_at <= now()
            ORDER BY scheduled_at
            LIMIT $1
        "#;

        let rows: Vec<ScheduledRow> = sqlx::query_as(query)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(ScheduledNotification::from).collect())
    }

    async fn mark_scheduled_sent(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE scheduled_notifications SET sent = TRUE, sent_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn pending_requests(&self, limit: i64) -> Result<Vec<NotificationRequest>> {
        let query = r#"
            SELECT id, receiver_token, title, body
            FROM notification_requests
            ORDER BY created_at
            LIMIT $1
        "#;

        let rows: Vec<RequestRow> = sqlx::query_as(query)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(NotificationRequest::from).collect())
    }

    async fn delete_request(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM notification_requests WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

pub struct ScheduledNotificationWorker {
    queue: Arc<dyn NotificationQueue>,
    store: Arc<dyn UserStore>,
    sender: Arc<dyn PushSender>,
    poll_interval: Duration,
    batch_size: i64,
}

impl ScheduledNotificationWorker {
    pub fn new(
        queue: Arc<dyn NotificationQueue>,
        store: Arc<dyn UserStore>,
        sender: Arc<dyn PushSender>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            queue,
            store,
            sender,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            batch_size: config.batch_size,
        }
    }

    pub async fn run(self) {
        info!(
            "Scheduled notification worker polling every {:?}",
            self.poll_interval
        );
        let mut ticker = interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.process_due().await {
                warn!("Scheduled notification poll failed: {}", e);
            }
        }
    }

    pub async fn process_due(&self) -> Result<()> {
        let due = self.queue.due_scheduled(self.batch_size).await?;

        for row in due {
            match self.store.get_user(row.user_id).await? {
                None => {
                    warn!(
                        "Scheduled notification {} references unknown user {}",
                        row.id, row.user_id
                    );
                    self.queue.mark_scheduled_sent(row.id).await?;
                }
                Some(user) => match user.fcm_token.as_deref() {
                    None => {
                        warn!(
                            "No FCM token for user {}, dropping scheduled notification {}",
                            row.user_id, row.id
                        );
                        self.queue.mark_scheduled_sent(row.id).await?;
                    }
                    Some(token) => {
                        match self
                            .sender
                            .send(token, &row.title, &row.body, SCHEDULED_ENGAGEMENT_TYPE)
                            .await
                        {
                            Ok(message_id) => {
                                debug!("Scheduled notification {} sent: {}", row.id, message_id);
                                self.queue.mark_scheduled_sent(row.id).await?;
                            }
                            Err(e) => {
                                // Left unsent; picked up again on the next poll.
                                warn!("Scheduled notification {} delivery failed: {}", row.id, e);
                            }
                        }
                    }
                },
            }
        }

        Ok(())
    }
}

pub struct NotificationRequestWorker {
    queue: Arc<dyn NotificationQueue>,
    sender: Arc<dyn PushSender>,
    poll_interval: Duration,
    batch_size: i64,
}

impl NotificationRequestWorker {
    pub fn new(
        queue: Arc<dyn NotificationQueue>,
        sender: Arc<dyn PushSender>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            queue,
            sender,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            batch_size: config.batch_size,
        }
    }

    pub async fn run(self) {
        info!(
            "Notification request worker polling every {:?}",
            self.poll_interval
        );
        let mut ticker = interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.process_pending().await {
                warn!("Notification request poll failed: {}", e);
            }
        }
    }

    pub async fn process_pending(&self) -> Result<()> {
        let pending = self.queue.pending_requests(self.batch_size).await?;

        for row in pending {
            match self
                .sender
                .send(&row.receiver_token, &row.title, &row.body, DIRECT_TYPE)
                .await
            {
                Ok(message_id) => {
                    debug!("Notification request {} sent: {}", row.id, message_id);
                    self.queue.delete_request(row.id).await?;
                }
                Err(e) => {
                    // Left in place for the next poll.
                    warn!("Notification request {} delivery failed: {}", row.id, e);
                }
            }
        }

        Ok(())
    }
}
