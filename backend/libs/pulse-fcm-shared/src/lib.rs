/// Pulse FCM Shared Library
///
/// A Firebase Cloud Messaging (HTTP v1) client for sending push notifications
/// to Android devices across the Pulse platform.
///
/// It handles:
/// - OAuth2 access token generation from a Google service account
/// - Token caching with automatic refresh
/// - Single-device message delivery with Android notification options
/// - Device token validation
pub mod client;
pub mod errors;
pub mod models;

pub use client::FcmClient;
pub use errors::FcmError;
pub use models::{AndroidConfig, AndroidNotification, FcmSendResult, ServiceAccountKey};
