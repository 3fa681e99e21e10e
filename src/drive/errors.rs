//! Drive API Error Types
//!
//! Structured error handling for Google Drive API operations.
//! Maps HTTP status codes to specific error variants.

/// Drive API error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriveError {
    #[error("Authentication expired, token needs refresh")]
    AuthExpired,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    #[error("Request timeout")]
    Timeout,

    #[error("Drive quota exceeded, retry later: {0}")]
    RateLimited(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Request error: {0}")]
    Request(String),
}

impl DriveError {
    /// Create a DriveError from an HTTP status code and response body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => DriveError::AuthExpired,
            // Drive reports per-user limits as 403 with a rate-limit reason
            403 if is_rate_limit_reason(body) => DriveError::RateLimited(body.to_string()),
            403 => DriveError::Forbidden(body.to_string()),
            404 => DriveError::NotFound(body.to_string()),
            408 => DriveError::Timeout,
            429 => DriveError::RateLimited(body.to_string()),
            500..=599 => DriveError::Server(status, body.to_string()),
            _ => DriveError::Request(format!("HTTP {}: {}", status, body)),
        }
    }
}

fn is_rate_limit_reason(body: &str) -> bool {
    body.contains("rateLimitExceeded") || body.contains("RateLimitExceeded")
}

impl From<reqwest::Error> for DriveError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DriveError::Timeout
        } else if e.is_decode() {
            DriveError::Decode(e.to_string())
        } else if e.is_connect() || e.is_request() {
            DriveError::Network(e.to_string())
        } else if let Some(status) = e.status() {
            DriveError::from_status(status.as_u16(), &e.to_string())
        } else {
            DriveError::Request(e.to_string())
        }
    }
}
