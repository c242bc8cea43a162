/// Queue worker behavior tests
///
/// Drives one poll cycle of each worker against in-memory queue, store, and
/// sender fakes:
/// - scheduled rows for unknown or token-less users are marked handled
/// - scheduled rows are marked sent after delivery, left unsent on failure
/// - request rows are deleted after delivery, left in place on failure
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use engagement_service::config::WorkerConfig;
use engagement_service::models::{
    EngagementUpdate, NotificationPreferences, NotificationRequest, ScheduledNotification, User,
};
use engagement_service::services::{
    NotificationQueue, NotificationRequestWorker, PushError, PushSender,
    ScheduledNotificationWorker, UserStore,
};
use engagement_service::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

struct InMemoryQueue {
    scheduled: Mutex<Vec<ScheduledNotification>>,
    requests: Mutex<Vec<NotificationRequest>>,
}

impl InMemoryQueue {
    fn new(
        scheduled: Vec<ScheduledNotification>,
        requests: Vec<NotificationRequest>,
    ) -> Arc<Self> {
        Arc::new(Self {
            scheduled: Mutex::new(scheduled),
            requests: Mutex::new(requests),
        })
    }

    fn scheduled_row(&self, id: Uuid) -> ScheduledNotification {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .expect("scheduled row missing")
    }

    fn request_ids(&self) -> Vec<Uuid> {
        self.requests.lock().unwrap().iter().map(|r| r.id).collect()
    }
}

#[async_trait]
impl NotificationQueue for InMemoryQueue {
    async fn due_scheduled(&self, limit: i64) -> Result<Vec<ScheduledNotification>> {
        let now = Utc::now();
        Ok(self
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .filter(|n| !n.sent && n.scheduled_at <= now)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_scheduled_sent(&self, id: Uuid) -> Result<()> {
        let mut scheduled = self.scheduled.lock().unwrap();
        let row = scheduled
            .iter_mut()
            .find(|n| n.id == id)
            .expect("marked unknown row");
        row.sent = true;
        row.sent_at = Some(Utc::now());
        Ok(())
    }

    async fn pending_requests(&self, limit: i64) -> Result<Vec<NotificationRequest>> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn delete_request(&self, id: Uuid) -> Result<()> {
        self.requests.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

struct QueueUserStore {
    users: HashMap<Uuid, User>,
}

impl QueueUserStore {
    fn with_users(users: Vec<User>) -> Arc<Self> {
        Arc::new(Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        })
    }
}

#[async_trait]
impl UserStore for QueueUserStore {
    async fn list_candidates(&self, _today: NaiveDate) -> Result<Vec<User>> {
        Ok(self.users.values().cloned().collect())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&user_id).cloned())
    }

    async fn set_daily_preference(&self, _user_id: Uuid, _enabled: bool) -> Result<bool> {
        Ok(false)
    }

    async fn commit_engagement_updates(&self, _updates: &[EngagementUpdate]) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeSender {
    sent: Mutex<Vec<String>>,
    fail_tokens: Vec<String>,
}

impl FakeSender {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing_for(tokens: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fail_tokens: tokens.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        })
    }

    fn sent_tokens(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for FakeSender {
    async fn send(
        &self,
        token: &str,
        _title: &str,
        _body: &str,
        _message_type: &str,
    ) -> std::result::Result<String, PushError> {
        if self.fail_tokens.iter().any(|t| t == token) {
            return Err(PushError::Delivery("simulated provider error".to_string()));
        }
        self.sent.lock().unwrap().push(token.to_string());
        Ok("projects/pulse/messages/1".to_string())
    }
}

fn worker_config() -> WorkerConfig {
    WorkerConfig {
        poll_interval_secs: 30,
        batch_size: 100,
    }
}

fn user_with_token(token: Option<&str>) -> User {
    User {
        id: Uuid::new_v4(),
        fcm_token: token.map(|t| t.to_string()),
        notification_preferences: NotificationPreferences::default(),
        last_engagement_notification: None,
        engagement_notifications_count: 0,
    }
}

fn due_notification(user_id: Uuid) -> ScheduledNotification {
    ScheduledNotification {
        id: Uuid::new_v4(),
        user_id,
        title: "Reminder".to_string(),
        body: "Your daily check-in".to_string(),
        scheduled_at: Utc::now() - Duration::minutes(5),
        sent: false,
        sent_at: None,
    }
}

fn request(token: &str) -> NotificationRequest {
    NotificationRequest {
        id: Uuid::new_v4(),
        receiver_token: token.to_string(),
        title: "Hello".to_string(),
        body: "World".to_string(),
    }
}

#[tokio::test]
async fn test_scheduled_row_for_unknown_user_is_marked_handled() {
    let row = due_notification(Uuid::new_v4());
    let queue = InMemoryQueue::new(vec![row.clone()], Vec::new());
    let sender = FakeSender::new();
    let worker = ScheduledNotificationWorker::new(
        queue.clone(),
        QueueUserStore::with_users(Vec::new()),
        sender.clone(),
        &worker_config(),
    );

    worker.process_due().await.unwrap();

    // Never delivered, but not re-polled forever either.
    assert!(sender.sent_tokens().is_empty());
    assert!(queue.scheduled_row(row.id).sent);
    assert!(queue.due_scheduled(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scheduled_row_for_tokenless_user_is_marked_handled() {
    let user = user_with_token(None);
    let row = due_notification(user.id);
    let queue = InMemoryQueue::new(vec![row.clone()], Vec::new());
    let sender = FakeSender::new();
    let worker = ScheduledNotificationWorker::new(
        queue.clone(),
        QueueUserStore::with_users(vec![user]),
        sender.clone(),
        &worker_config(),
    );

    worker.process_due().await.unwrap();

    assert!(sender.sent_tokens().is_empty());
    assert!(queue.scheduled_row(row.id).sent);
}

#[tokio::test]
async fn test_scheduled_row_is_marked_sent_after_delivery() {
    let user = user_with_token(Some("tok-sched"));
    let row = due_notification(user.id);
    let queue = InMemoryQueue::new(vec![row.clone()], Vec::new());
    let sender = FakeSender::new();
    let worker = ScheduledNotificationWorker::new(
        queue.clone(),
        QueueUserStore::with_users(vec![user]),
        sender.clone(),
        &worker_config(),
    );

    worker.process_due().await.unwrap();

    assert_eq!(sender.sent_tokens(), vec!["tok-sched".to_string()]);
    let after = queue.scheduled_row(row.id);
    assert!(after.sent);
    assert!(after.sent_at.is_some());
}

#[tokio::test]
async fn test_scheduled_row_is_left_unsent_on_delivery_failure() {
    let user = user_with_token(Some("tok-flaky"));
    let row = due_notification(user.id);
    let queue = InMemoryQueue::new(vec![row.clone()], Vec::new());
    let sender = FakeSender::failing_for(&["tok-flaky"]);
    let worker = ScheduledNotificationWorker::new(
        queue.clone(),
        QueueUserStore::with_users(vec![user]),
        sender,
        &worker_config(),
    );

    worker.process_due().await.unwrap();

    // Still pending: the next poll retries it.
    assert!(!queue.scheduled_row(row.id).sent);
    assert_eq!(queue.due_scheduled(100).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_request_row_is_deleted_after_delivery() {
    let req = request("tok-direct");
    let queue = InMemoryQueue::new(Vec::new(), vec![req.clone()]);
    let sender = FakeSender::new();
    let worker = NotificationRequestWorker::new(queue.clone(), sender.clone(), &worker_config());

    worker.process_pending().await.unwrap();

    assert_eq!(sender.sent_tokens(), vec!["tok-direct".to_string()]);
    assert!(queue.request_ids().is_empty());
}

#[tokio::test]
async fn test_request_row_is_left_on_delivery_failure() {
    let flaky = request("tok-down");
    let healthy = request("tok-up");
    let queue = InMemoryQueue::new(Vec::new(), vec![flaky.clone(), healthy.clone()]);
    let sender = FakeSender::failing_for(&["tok-down"]);
    let worker = NotificationRequestWorker::new(queue.clone(), sender.clone(), &worker_config());

    worker.process_pending().await.unwrap();

    // One failure does not block the rest of the batch.
    assert_eq!(sender.sent_tokens(), vec!["tok-up".to_string()]);
    assert_eq!(queue.request_ids(), vec![flaky.id]);
}
