//! Errors returned by the platform client.

use agentic_core::ValidationError;
use serde::Deserialize;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Structured error decoded from a non-2xx platform response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("API error (status {status}): {message}")]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,

    /// Human-readable message
    pub message: String,

    /// Machine-readable code, when the platform sent one
    pub code: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    code: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Nested { error: ErrorBody },
    Flat(ErrorBody),
}

impl ApiError {
    /// Decode an error envelope, falling back to the raw body as the message.
    pub fn from_body(status: u16, body: &str) -> Self {
        let parsed = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope::Nested { error }) => Some(error),
            Ok(ErrorEnvelope::Flat(body)) => Some(body),
            Err(_) => None,
        };

        match parsed {
            Some(ErrorBody { message: Some(message), code, .. })
            | Some(ErrorBody { message: None, error: Some(message), code }) => Self {
                status,
                message,
                code,
            },
            _ => Self {
                status,
                message: body.trim().to_string(),
                code: None,
            },
        }
    }

    /// 5xx responses are worth retrying.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Errors that can occur while talking to the platform.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Client configuration rejected before any request
    #[error("configuration error: {0}")]
    Config(String),

    /// Local input validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Connection refused, timeout, or another transport failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Platform answered with an error status
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Success status but the body did not decode
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Every attempt failed; carries the last failure
    #[error("request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made, including the first
        attempts: u32,
        /// Error from the final attempt
        last: Box<ClientError>,
    },
}

impl ClientError {
    /// Errors the retry loop should try again.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Api(api) => api.is_server_error(),
            ClientError::RetriesExhausted { .. } => true,
            _ => false,
        }
    }

    /// HTTP status behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(api) => Some(api.status),
            ClientError::RetriesExhausted { last, .. } => last.status(),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_envelope() {
        let err = ApiError::from_body(
            404,
            r#"{"error":{"message":"task not found","code":"not_found"}}"#,
        );
        assert_eq!(err.status, 404);
        assert_eq!(err.message, "task not found");
        assert_eq!(err.code.as_deref(), Some("not_found"));
    }

    #[test]
    fn test_flat_error_envelope() {
        let err = ApiError::from_body(422, r#"{"message":"bad status","code":"invalid"}"#);
        assert_eq!(err.message, "bad status");
        assert_eq!(err.code.as_deref(), Some("invalid"));

        let err = ApiError::from_body(401, r#"{"error":"unauthorized"}"#);
        assert_eq!(err.message, "unauthorized");
        assert_eq!(err.code, None);
    }

    #[test]
    fn test_unparseable_body_becomes_message() {
        let err = ApiError::from_body(502, "<html>Bad Gateway</html>\n");
        assert_eq!(err.message, "<html>Bad Gateway</html>");
        assert!(err.is_server_error());
    }

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Api(ApiError::from_body(503, "")).is_transient());
        assert!(!ClientError::Api(ApiError::from_body(400, "")).is_transient());
        assert!(!ClientError::Cancelled.is_transient());
    }
}
