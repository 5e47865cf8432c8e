//! Error types for Railbird
//!
//! Every layer converges on this enum; the provider crate defines its own
//! transport-level taxonomy and converts into it.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Railbird error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Session lifecycle
    // ========================================================================
    /// The warm-up exchange failed during session creation. The session is
    /// kept discoverable in its uninitialized state so callers can retry.
    #[error("Warm-up failed for session {session}: {message}")]
    WarmupFailed { session: String, message: String },

    /// A decision was requested outside the ready state.
    #[error("Session not ready: {0}")]
    SessionNotReady(String),

    /// Unknown session id. Caller error, never retried internally.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    // ========================================================================
    // Remote completion
    // ========================================================================
    /// Network or HTTP failure reaching the completion service.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The reply was cut off before completion and must not be appended.
    #[error("Truncated response: {0}")]
    Truncated(String),

    /// The reply carried no usable content.
    #[error("Empty response: {0}")]
    EmptyReply(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Any other completion-client failure.
    #[error("Completion client error: {0}")]
    Client(String),

    // ========================================================================
    // General
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // External conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a caller could reasonably retry the failed operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::RateLimited(_) | Error::WarmupFailed { .. }
        )
    }

    /// Whether the error indicates a mistake on the caller's side.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::SessionNotFound(_) | Error::SessionNotReady(_) | Error::InvalidInput(_)
        )
    }

    /// Warm-up failure helper
    pub fn warmup(session: impl Into<String>, message: impl Into<String>) -> Self {
        Error::WarmupFailed {
            session: session.into(),
            message: message.into(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Transport("connection reset".into()).is_retryable());
        assert!(Error::RateLimited("slow down".into()).is_retryable());
        assert!(!Error::Truncated("length".into()).is_retryable());
        assert!(!Error::SessionNotFound("abc".into()).is_retryable());
    }

    #[test]
    fn test_caller_error_classification() {
        assert!(Error::SessionNotFound("abc".into()).is_caller_error());
        assert!(Error::SessionNotReady("warming".into()).is_caller_error());
        assert!(!Error::Transport("timeout".into()).is_caller_error());
    }
}
