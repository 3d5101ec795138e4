//! Error taxonomy for the sync layer.
//!
//! - [`TransportError`]: network or HTTP failure, carries status and message
//! - [`ValidationError`]: malformed request payload, caught before transport
//! - [`SyncError`]: what subscribers and mutation callers observe
//!
//! All of them are `Clone` so a single failure can be fanned out to every
//! subscriber of a cache entry.

use thiserror::Error;

/// Where a transport failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The server answered with a non-success status.
    Http,
    /// No response was received.
    Network,
    /// The request could not be mapped to a backend path.
    Unroutable,
}

/// Network or server failure from the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {}{message}", status_prefix(.status))]
pub struct TransportError {
    pub kind: TransportErrorKind,
    /// HTTP status code, `None` when no response was received.
    pub status: Option<u16>,
    /// Server body or client-side description of the failure.
    pub message: String,
}

fn status_prefix(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!("HTTP {status}: "),
        None => String::new(),
    }
}

impl TransportError {
    /// Creates an error for a response with the given status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Http,
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates an error for a failure that produced no response.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Network,
            status: None,
            message: message.into(),
        }
    }

    /// Creates an error for a request that has no backend path.
    pub fn unroutable(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Unroutable,
            status: None,
            message: message.into(),
        }
    }

    /// Returns true if retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match (self.kind, self.status) {
            (TransportErrorKind::Unroutable, _) => false,
            (_, None) => true,
            (_, Some(status)) => status >= 500 || status == 408 || status == 429,
        }
    }
}

/// Malformed request payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty or whitespace.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// Free text exceeds the accepted length.
    #[error("text is {actual} characters, limit is {max}")]
    TextTooLong { max: usize, actual: usize },
}

/// Error observed by cache subscribers and mutation callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Transport or server failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Request rejected before reaching the transport.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The fetch was aborted before it settled.
    #[error("request cancelled")]
    Cancelled,
}

impl SyncError {
    /// HTTP status of a transport failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Transport(e) => e.status,
            _ => None,
        }
    }

    /// Returns true if an automatic retry may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport(e) => e.is_retryable(),
            SyncError::Validation(_) | SyncError::Cancelled => false,
        }
    }
}

/// Result type alias using SyncError.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        let err = TransportError::http(401, "JWT expired");
        assert_eq!(err.to_string(), "transport error: HTTP 401: JWT expired");

        let err = TransportError::network("connection refused");
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn retryable_statuses() {
        assert!(TransportError::network("reset").is_retryable());
        assert!(TransportError::http(503, "unavailable").is_retryable());
        assert!(TransportError::http(429, "slow down").is_retryable());
        assert!(!TransportError::http(404, "missing").is_retryable());
        assert!(!TransportError::http(400, "bad").is_retryable());
    }

    #[test]
    fn unroutable_is_never_retried() {
        let err = TransportError::unroutable("no route for query key [\"grades\"]");
        assert_eq!(err.status, None);
        assert!(!err.is_retryable());
        assert!(!SyncError::from(err.clone()).is_retryable());
        assert_eq!(
            err.to_string(),
            "transport error: no route for query key [\"grades\"]"
        );
    }

    #[test]
    fn sync_error_wraps_transport() {
        let err: SyncError = TransportError::http(500, "boom").into();
        assert_eq!(err.status(), Some(500));
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "transport error: HTTP 500: boom");
    }

    #[test]
    fn validation_is_never_retryable() {
        let err: SyncError = ValidationError::EmptyField { field: "text" }.into();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "validation error: text must not be empty");
    }
}
