use std::fmt;

use thiserror::Error;

/// The last failure recorded while dispatching a request.
///
/// `status` is absent when the candidate never produced an HTTP response
/// (connection refused, timeout, DNS failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub url: String,
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} returned {}: {}", self.url, status, self.message),
            None => write!(f, "{} unreachable: {}", self.url, self.message),
        }
    }
}

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(RemoteFailure),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        PortalError::Validation(message.into())
    }

    pub fn invalid_transition(from: impl fmt::Debug, to: impl fmt::Debug) -> Self {
        PortalError::InvalidTransition {
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }
    }

    /// Only remote failures are worth retrying; everything else needs the
    /// user to correct input or pick a different action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PortalError::RemoteUnavailable(_))
    }

    /// HTTP status of the last failed candidate, when there was one.
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            PortalError::RemoteUnavailable(failure) => failure.status,
            _ => None,
        }
    }
}

impl From<config::ConfigError> for PortalError {
    fn from(err: config::ConfigError) -> Self {
        PortalError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failure_display_includes_status_and_message() {
        let failure = RemoteFailure {
            url: "http://b/api/x".to_string(),
            status: Some(404),
            message: "Not Found".to_string(),
        };
        assert_eq!(failure.to_string(), "http://b/api/x returned 404: Not Found");

        let err = PortalError::RemoteUnavailable(failure);
        assert!(err.is_retryable());
        assert_eq!(err.remote_status(), Some(404));
    }

    #[test]
    fn transport_failure_has_no_status() {
        let failure = RemoteFailure {
            url: "http://a".to_string(),
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(failure.to_string(), "http://a unreachable: connection refused");
    }

    #[test]
    fn validation_is_not_retryable() {
        assert!(!PortalError::validation("missing currency").is_retryable());
        assert_eq!(PortalError::validation("x").remote_status(), None);
    }
}
