//! Response parsing for the health endpoints.

use super::error::ProbeError;
use super::HealthSnapshot;
use serde::Deserialize;

/// Fallback text when an error response carries no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred while fetching the data";

/// `GET <root>/connected` response format
#[derive(Deserialize)]
struct PollEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<HealthSnapshot>,
    #[serde(default)]
    message: Option<String>,
}

/// `GET <root>/sse/connected` event payload
#[derive(Deserialize)]
struct StreamEnvelope {
    data: HealthSnapshot,
}

/// Error body shape shared by all endpoints
#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
}

/// Parse a successful poll response body.
pub fn parse_poll_body(body: &str) -> Result<HealthSnapshot, ProbeError> {
    let envelope: PollEnvelope =
        serde_json::from_str(body).map_err(|e| ProbeError::ParseError(e.to_string()))?;

    if envelope.success == Some(false) {
        return Err(ProbeError::Rejected(
            envelope
                .message
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
        ));
    }

    envelope
        .data
        .ok_or_else(|| ProbeError::ParseError("missing field `data`".to_string()))
}

/// Parse the `data` of one event-stream message.
pub fn parse_stream_event(payload: &str) -> Result<HealthSnapshot, ProbeError> {
    serde_json::from_str::<StreamEnvelope>(payload)
        .map(|envelope| envelope.data)
        .map_err(|e| ProbeError::ParseError(e.to_string()))
}

/// Build the error for a non-2xx response, using the body's `message` when present.
pub fn parse_error_body(status: u16, body: &str) -> ProbeError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());

    ProbeError::HttpError { status, message }
}
