//! Error types for gateway operations.

use thiserror::Error;

/// Errors surfaced by the REST gateway.
///
/// The gateway never retries; every caller decides how to present the
/// failure. `SessionExpired` additionally means the session has already
/// been cleared as a side effect.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Login rejected the supplied username/password. Leaves any existing
    /// session untouched.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// An authenticated call was rejected with 401; the session has been
    /// cleared and the console must return to the login view.
    #[error("session expired, sign in again")]
    SessionExpired,

    /// Backend returned a non-success status other than 401. The message
    /// carries the backend-supplied detail text when present.
    #[error("server error {status}: {message}")]
    Http { status: u16, message: String },

    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the configured deadline.
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Backend response doesn't match the expected format.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Classify a transport-level failure.
    pub(crate) fn from_transport(e: reqwest::Error, timeout_seconds: u64) -> Self {
        if e.is_timeout() {
            ApiError::Timeout(timeout_seconds)
        } else {
            ApiError::Network(e.to_string())
        }
    }

    /// True for the forced-logout case.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}
