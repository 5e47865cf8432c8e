//! Client-side error taxonomy
//!
//! `ClientError` covers everything that can go wrong between building a
//! completion request and accepting its reply. It converts into
//! `railbird_foundation::Error` at the layer boundary.

use crate::retry::{RetryClassification, RetryableError};
use railbird_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors that can occur talking to the completion service
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// API key is missing or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded{}", .retry_after_ms.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    /// Context length exceeded
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    /// Server error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network failure (connection, DNS, timeout)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The reply was cut off (`finish_reason = "length"`)
    #[error("Truncated response: {0}")]
    Truncated(String),

    /// The reply carried no usable content
    #[error("Empty response: {0}")]
    Empty(String),

    /// Invalid request (bad parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response body did not match the wire contract
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client not configured
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl RetryableError for ClientError {
    fn classify(&self) -> RetryClassification {
        match self {
            ClientError::RateLimited { retry_after_ms } => RetryClassification::RateLimited {
                retry_after_ms: *retry_after_ms,
            },

            // Transient: worth another attempt
            ClientError::ServerError(_) | ClientError::Transport(_) => RetryClassification::Retry,

            // Everything else is deterministic; retrying resends the same
            // doomed request
            ClientError::Authentication(_)
            | ClientError::ContextLengthExceeded(_)
            | ClientError::Truncated(_)
            | ClientError::Empty(_)
            | ClientError::InvalidRequest(_)
            | ClientError::InvalidResponse(_)
            | ClientError::Parse(_)
            | ClientError::NotConfigured(_)
            | ClientError::Unknown(_) => RetryClassification::NoRetry,
        }
    }
}

impl ClientError {
    /// Create from HTTP status code and body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ClientError::Authentication(body.to_string()),
            429 => ClientError::RateLimited {
                retry_after_ms: extract_retry_after(body),
            },
            400 => {
                if body.contains("context") || body.contains("too long") || body.contains("token") {
                    ClientError::ContextLengthExceeded(body.to_string())
                } else {
                    ClientError::InvalidRequest(body.to_string())
                }
            }
            500..=599 => ClientError::ServerError(body.to_string()),
            _ => ClientError::Unknown(format!("HTTP {}: {}", status, body)),
        }
    }
}

/// Try to extract retry-after value from error body (in milliseconds)
fn extract_retry_after(body: &str) -> Option<u64> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(secs) = json
            .get("error")
            .and_then(|e| e.get("retry_after"))
            .and_then(|v| v.as_f64())
        {
            return Some((secs * 1000.0) as u64);
        }
    }

    if let Some(idx) = body.find("retry") {
        let after = &body[idx..];
        let num_str: String = after
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        if let Ok(secs) = num_str.parse::<f64>() {
            return Some((secs * 1000.0) as u64);
        }
    }

    None
}

// ============================================================================
// railbird_foundation::Error conversion
// ============================================================================

impl From<ClientError> for FoundationError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(msg) => FoundationError::Transport(msg),
            ClientError::Truncated(msg) => FoundationError::Truncated(msg),
            ClientError::Empty(msg) => FoundationError::EmptyReply(msg),
            ClientError::RateLimited { retry_after_ms } => FoundationError::RateLimited(
                retry_after_ms
                    .map(|ms| format!("retry after {}ms", ms))
                    .unwrap_or_else(|| "rate limited".to_string()),
            ),
            ClientError::NotConfigured(msg) => FoundationError::Config(msg),
            other => FoundationError::Client(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert!(matches!(
            ClientError::from_http_status(401, "bad key"),
            ClientError::Authentication(_)
        ));
        assert!(matches!(
            ClientError::from_http_status(403, "forbidden"),
            ClientError::Authentication(_)
        ));
        assert!(matches!(
            ClientError::from_http_status(429, "{}"),
            ClientError::RateLimited { .. }
        ));
        assert!(matches!(
            ClientError::from_http_status(503, "overloaded"),
            ClientError::ServerError(_)
        ));
        assert!(matches!(
            ClientError::from_http_status(400, "prompt token count too long"),
            ClientError::ContextLengthExceeded(_)
        ));
        assert!(matches!(
            ClientError::from_http_status(400, "bad temperature"),
            ClientError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_retry_after_from_json_body() {
        let body = r#"{"error": {"retry_after": 1.5}}"#;
        assert_eq!(extract_retry_after(body), Some(1500));
    }

    #[test]
    fn test_retry_classification() {
        assert_eq!(
            ClientError::Transport("reset".into()).classify(),
            RetryClassification::Retry
        );
        assert_eq!(
            ClientError::ServerError("500".into()).classify(),
            RetryClassification::Retry
        );
        assert_eq!(
            ClientError::Truncated("length".into()).classify(),
            RetryClassification::NoRetry
        );
        assert_eq!(
            ClientError::Parse("bad json".into()).classify(),
            RetryClassification::NoRetry
        );
    }

    #[test]
    fn test_foundation_conversion_keeps_taxonomy() {
        assert!(matches!(
            FoundationError::from(ClientError::Truncated("x".into())),
            FoundationError::Truncated(_)
        ));
        assert!(matches!(
            FoundationError::from(ClientError::Empty("x".into())),
            FoundationError::EmptyReply(_)
        ));
        assert!(matches!(
            FoundationError::from(ClientError::Transport("x".into())),
            FoundationError::Transport(_)
        ));
    }
}
