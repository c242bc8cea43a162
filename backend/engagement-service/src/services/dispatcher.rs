/// Engagement Notification Dispatcher
///
/// The daily batch job: list users not yet notified today, pick a message per
/// user from the content pools, deliver it, and stamp every successfully
/// notified user in one atomic batch commit.
///
/// Failure semantics:
/// - candidate-query or batch-commit errors abort the run and propagate
/// - a single user's delivery failure is logged and skipped; the user stays
///   eligible for the next scheduled run (there is no same-run retry)
///
/// Overlapping runs are not guarded against; the date-inequality candidate
/// query is the only safeguard. A second run on the same day after a committed
/// first run finds zero candidates.
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::content::{self, ContentItem};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{DispatchSummary, EngagementUpdate};
use crate::services::push::PushSender;
use crate::services::store::UserStore;

/// Metadata type tag carried in the push data payload.
pub const ENGAGEMENT_TYPE: &str = "engagement";

/// Response payload of the on-demand single-user send.
#[derive(Debug, Clone, Serialize)]
pub struct ImmediateSendResult {
    pub message_id: String,
    pub content: ContentItem,
}

pub struct EngagementDispatcher {
    store: Arc<dyn UserStore>,
    sender: Arc<dyn PushSender>,
}

impl EngagementDispatcher {
    pub fn new(store: Arc<dyn UserStore>, sender: Arc<dyn PushSender>) -> Self {
        Self { store, sender }
    }

    /// Run the daily batch for `today`.
    pub async fn run(&self, today: NaiveDate) -> Result<DispatchSummary> {
        info!("Starting engagement notification dispatch for {}", today);

        let candidates = self.store.list_candidates(today).await?;
        info!("Found {} users to notify", candidates.len());

        let mut summary = DispatchSummary {
            candidates: candidates.len(),
            ..Default::default()
        };
        let mut staged: Vec<EngagementUpdate> = Vec::new();

        for user in &candidates {
            if !user.notification_preferences.daily_enabled() {
                debug!("Skipping user {} - notifications disabled", user.id);
                summary.skipped_opt_out += 1;
                metrics::observe_skip("opt_out");
                continue;
            }

            let Some(token) = user.fcm_token.as_deref() else {
                debug!("No FCM token for user {}", user.id);
                summary.skipped_missing_token += 1;
                metrics::observe_skip("missing_token");
                continue;
            };

            let item = content::pick_random(&mut rand::thread_rng());

            match self
                .sender
                .send(token, item.title, item.body, ENGAGEMENT_TYPE)
                .await
            {
                Ok(message_id) => {
                    debug!("Notification sent to {}: {}", user.id, message_id);
                    staged.push(EngagementUpdate {
                        user_id: user.id,
                        date: today,
                    });
                    summary.sent += 1;
                    metrics::observe_sent();
                }
                Err(e) => {
                    warn!("Failed to send notification to {}: {}", user.id, e);
                    summary.send_failures += 1;
                    metrics::observe_send_failure();
                }
            }
        }

        if let Err(e) = self.store.commit_engagement_updates(&staged).await {
            // The sends already happened; the unstamped users may be notified
            // again on the next run.
            error!(
                "Batch commit failed after {} successful sends: {}",
                staged.len(),
                e
            );
            return Err(e);
        }

        info!(
            "Successfully sent {} engagement notifications ({} opted out, {} without token, {} failed)",
            summary.sent,
            summary.skipped_opt_out,
            summary.skipped_missing_token,
            summary.send_failures
        );
        Ok(summary)
    }

    /// Send one engagement notification to a single user, synchronously.
    ///
    /// Operational testing hook; unlike the batch run it does not stamp
    /// `last_engagement_notification`, so the user stays eligible for the
    /// scheduled dispatch.
    pub async fn send_immediate(&self, user_id: Uuid) -> Result<ImmediateSendResult> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let token = user
            .fcm_token
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("no FCM token found for user".to_string()))?;

        let item = content::pick_random(&mut rand::thread_rng());
        let message_id = self
            .sender
            .send(token, item.title, item.body, ENGAGEMENT_TYPE)
            .await?;

        info!("Immediate engagement notification sent to {}", user_id);
        Ok(ImmediateSendResult {
            message_id,
            content: item,
        })
    }
}
