use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::{Arc, Mutex};

use crate::errors::FcmError;
use crate::models::*;

const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Firebase Cloud Messaging client
///
/// Sends push notifications through the FCM HTTP v1 API. Manages OAuth2
/// access token generation from a service account, with caching and refresh.
pub struct FcmClient {
    pub project_id: String,
    credentials: Arc<ServiceAccountKey>,
    token_cache: Arc<Mutex<Option<TokenCache>>>,
    http_client: reqwest::Client,
}

impl FcmClient {
    /// Create a new FCM client from a service account key.
    pub fn new(credentials: ServiceAccountKey) -> Self {
        Self {
            project_id: credentials.project_id.clone(),
            credentials: Arc::new(credentials),
            token_cache: Arc::new(Mutex::new(None)),
            http_client: reqwest::Client::new(),
        }
    }

    /// Send a notification to a single device.
    ///
    /// `data` carries the custom key/value payload delivered alongside the
    /// notification; `android` carries channel/appearance options.
    pub async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
        android: Option<AndroidConfig>,
    ) -> Result<FcmSendResult, FcmError> {
        if !Self::validate_token(device_token) {
            return Err(FcmError::InvalidToken);
        }

        let access_token = self.get_access_token().await?;

        let message = FcmMessage {
            message: FcmMessageContent {
                token: device_token.to_string(),
                notification: FcmNotification {
                    title: title.to_string(),
                    body: body.to_string(),
                },
                data,
                android,
            },
        };

        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.project_id
        );

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(&message)
            .send()
            .await
            .map_err(|e| FcmError::SendRequest(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            let fcm_response: FcmApiResponse = response
                .json()
                .await
                .map_err(|e| FcmError::ResponseParse(e.to_string()))?;

            let message_id = fcm_response
                .name
                .ok_or_else(|| FcmError::ResponseParse("missing message name".to_string()))?;

            tracing::debug!("FCM delivery successful: {}", message_id);
            Ok(FcmSendResult { message_id })
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            Err(FcmError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Cheap structural validation of a device token.
    ///
    /// FCM registration tokens are opaque strings, typically 100-200
    /// characters; anything empty, tiny, or absurdly long is rejected before
    /// we spend a round trip on it.
    pub fn validate_token(device_token: &str) -> bool {
        device_token.len() >= 10 && device_token.len() <= 1000
    }

    /// Get an OAuth2 access token for the FCM API, refreshing if the cached
    /// one expires within the next minute.
    async fn get_access_token(&self) -> Result<String, FcmError> {
        {
            let cache = self.token_cache.lock().expect("token cache lock poisoned");
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now().timestamp() + 60 {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let now = Utc::now();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: OAUTH_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| FcmError::KeyParse(e.to_string()))?;

        let assertion = encode(&Header::new(jsonwebtoken::Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| FcmError::JwtEncode(e.to_string()))?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &assertion),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| FcmError::TokenRequest(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FcmError::TokenRequest(format!(
                "status {}",
                response.status()
            )));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| FcmError::TokenParse(e.to_string()))?;

        let expires_at = Utc::now().timestamp() + token_response.expires_in;
        {
            let mut cache = self.token_cache.lock().expect("token cache lock poisoned");
            *cache = Some(TokenCache {
                access_token: token_response.access_token.clone(),
                expires_at,
            });
        }

        Ok(token_response.access_token)
    }
}
