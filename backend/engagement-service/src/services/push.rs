/// Push delivery seam
///
/// The dispatcher and queue workers talk to this trait, never to the FCM
/// client directly, so the send path can be exercised with fakes in tests.
use async_trait::async_trait;
use pulse_fcm_shared::{AndroidConfig, AndroidNotification, FcmClient, FcmError};
use std::sync::Arc;
use thiserror::Error;

/// Android channel the mobile app registers for engagement pushes.
pub const ENGAGEMENT_CHANNEL_ID: &str = "engagement_channel";
pub const ENGAGEMENT_COLOR: &str = "#00C7BE";
pub const ENGAGEMENT_ICON: &str = "@mipmap/ic_launcher";
pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

#[derive(Debug, Error)]
pub enum PushError {
    /// The device token is invalid or unregistered; re-sending to it will not
    /// help until the app refreshes the token.
    #[error("invalid device token: {0}")]
    InvalidToken(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl From<FcmError> for PushError {
    fn from(err: FcmError) -> Self {
        if err.is_token_error() {
            PushError::InvalidToken(err.to_string())
        } else {
            PushError::Delivery(err.to_string())
        }
    }
}

/// One delivery attempt per call; no internal retry.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Send a notification to a single device. Returns the provider message
    /// identifier on success.
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        message_type: &str,
    ) -> Result<String, PushError>;
}

/// Production sender backed by the shared FCM client.
///
/// The client is optional so the service can come up without credentials;
/// every attempt then fails loudly instead of silently dropping sends.
pub struct FcmPushSender {
    client: Option<Arc<FcmClient>>,
}

impl FcmPushSender {
    pub fn new(client: Option<Arc<FcmClient>>) -> Self {
        Self { client }
    }

    fn android_options() -> AndroidConfig {
        AndroidConfig {
            notification: AndroidNotification {
                channel_id: Some(ENGAGEMENT_CHANNEL_ID.to_string()),
                color: Some(ENGAGEMENT_COLOR.to_string()),
                icon: Some(ENGAGEMENT_ICON.to_string()),
                notification_priority: Some("PRIORITY_HIGH".to_string()),
            },
        }
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        message_type: &str,
    ) -> Result<String, PushError> {
        let Some(client) = &self.client else {
            tracing::warn!("FCM client not configured");
            return Err(PushError::Delivery("FCM client not configured".to_string()));
        };

        let data = serde_json::json!({
            "type": message_type,
            "click_action": CLICK_ACTION,
        });

        let result = client
            .send(token, title, body, Some(data), Some(Self::android_options()))
            .await?;

        Ok(result.message_id)
    }
}
