use thiserror::Error;

/// FCM client error types
#[derive(Error, Debug)]
pub enum FcmError {
    #[error("Failed to parse private key: {0}")]
    KeyParse(String),

    #[error("Failed to encode JWT: {0}")]
    JwtEncode(String),

    #[error("Token request failed: {0}")]
    TokenRequest(String),

    #[error("Failed to parse token response: {0}")]
    TokenParse(String),

    #[error("FCM send request failed: {0}")]
    SendRequest(String),

    #[error("Failed to parse FCM response: {0}")]
    ResponseParse(String),

    #[error("FCM API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid device token")]
    InvalidToken,
}

impl FcmError {
    /// True for errors that indicate the device token itself is bad
    /// (unregistered, expired, malformed) rather than a transient failure.
    pub fn is_token_error(&self) -> bool {
        match self {
            FcmError::InvalidToken => true,
            FcmError::Api { status, message } => {
                let lower = message.to_lowercase();
                matches!(*status, 400 | 404)
                    || lower.contains("unregistered")
                    || lower.contains("invalid_argument") && lower.contains("token")
            }
            _ => false,
        }
    }
}
