use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user notification preference map, stored as JSONB on the user row.
///
/// Only the `daily` flag belongs to this service; the surrounding application
/// owns the rest of the map, so unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Daily engagement notification opt-out. Missing means enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<bool>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl NotificationPreferences {
    /// Only an explicit `false` counts as an opt-out.
    pub fn daily_enabled(&self) -> bool {
        self.daily != Some(false)
    }
}

/// User record, as read by the dispatcher.
///
/// Users are created and mutated by the surrounding application (signup, push
/// token refresh); this service reads them and performs one targeted update
/// per successful engagement send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// Device push token. Absence means the user is unreachable.
    pub fcm_token: Option<String>,

    pub notification_preferences: NotificationPreferences,

    /// Day stamp of the last engagement notification, moved forward at most
    /// once per calendar day and only after a successful send.
    pub last_engagement_notification: Option<NaiveDate>,

    pub engagement_notifications_count: i64,
}

/// Staged per-user update, applied in one atomic batch after the dispatch
/// iteration completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementUpdate {
    pub user_id: Uuid,
    pub date: NaiveDate,
}

/// Outcome of one dispatcher run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Users matched by the candidate query.
    pub candidates: usize,
    /// Notifications successfully delivered (and stamped).
    pub sent: usize,
    pub skipped_opt_out: usize,
    pub skipped_missing_token: usize,
    /// Delivery failures; these users stay eligible for the next run.
    pub send_failures: usize,
}

/// One-shot notification queued for a specific user at a specific time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub scheduled_at: DateTime<Utc>,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Raw delivery request written by the surrounding application; the row is
/// deleted once delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: Uuid,
    pub receiver_token: String,
    pub title: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_enabled_defaults_to_true() {
        let prefs = NotificationPreferences::default();
        assert!(prefs.daily_enabled());

        let prefs = NotificationPreferences {
            daily: Some(true),
            ..Default::default()
        };
        assert!(prefs.daily_enabled());

        let prefs = NotificationPreferences {
            daily: Some(false),
            ..Default::default()
        };
        assert!(!prefs.daily_enabled());
    }

    #[test]
    fn test_preferences_preserve_unknown_keys() {
        let raw = serde_json::json!({
            "daily": false,
            "marketing": true,
            "quiet_hours": "22:00-08:00"
        });

        let prefs: NotificationPreferences = serde_json::from_value(raw).unwrap();
        assert_eq!(prefs.daily, Some(false));
        assert_eq!(prefs.other["marketing"], true);

        let back = serde_json::to_value(&prefs).unwrap();
        assert_eq!(back["quiet_hours"], "22:00-08:00");
    }

    #[test]
    fn test_preferences_roundtrip_without_daily() {
        let prefs: NotificationPreferences = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(prefs.daily, None);

        let back = serde_json::to_value(&prefs).unwrap();
        assert_eq!(back, serde_json::json!({}));
    }

    #[test]
    fn test_dispatch_summary_serializes() {
        let summary = DispatchSummary {
            candidates: 5,
            sent: 3,
            skipped_opt_out: 1,
            skipped_missing_token: 1,
            send_failures: 0,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["sent"], 3);
        assert_eq!(json["candidates"], 5);
    }
}
