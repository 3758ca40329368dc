//! Error types for health probing.

use thiserror::Error;

/// Failures observed while talking to a monitored service.
///
/// Every variant is recoverable: the connection manager maps all of them to
/// the service's offline state and, when streaming, to a scheduled retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    /// Request timeout
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-2xx response
    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Service answered with `success: false`
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Invalid response body or event payload
    #[error("invalid response: {0}")]
    ParseError(String),

    /// Event stream ended
    #[error("event stream closed by server")]
    StreamClosed,

    /// No event within the heartbeat window
    #[error("heartbeat missed after {0}ms")]
    HeartbeatTimeout(u64),
}

impl ProbeError {
    /// Classify a reqwest error.
    pub fn from_reqwest(e: reqwest::Error, timeout_seconds: u64) -> Self {
        if e.is_timeout() {
            ProbeError::Timeout(timeout_seconds)
        } else if e.is_decode() || e.is_body() {
            ProbeError::ParseError(e.to_string())
        } else {
            ProbeError::ConnectionFailed(e.to_string())
        }
    }
}
