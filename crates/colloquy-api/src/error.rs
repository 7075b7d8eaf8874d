//! Error types for colloquy-api

use thiserror::Error;

/// Result type alias using colloquy-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the answer or history services
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service returned a non-success status
    #[error("service error ({code}): {message}")]
    Status { code: u16, message: String },

    /// Event stream could not be read or decoded
    #[error("stream error: {0}")]
    Stream(String),

    /// Response carried a content type the client cannot handle
    #[error("unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// Request was aborted by the caller
    #[error("request aborted")]
    Aborted,
}

impl Error {
    /// Create a status error from a code and message
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// The HTTP status code behind this error, if one is known
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { code, .. } => Some(*code),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error represents a caller-initiated abort
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    /// Check if the underlying request timed out
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout(),
            Error::Status { code, .. } => *code == 408,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_from_status_variant() {
        let e = Error::status(429, "slow down");
        assert_eq!(e.status_code(), Some(429));
    }

    #[test]
    fn test_status_code_absent() {
        assert_eq!(Error::Aborted.status_code(), None);
        assert_eq!(Error::Stream("eof".into()).status_code(), None);
    }

    #[test]
    fn test_timeout_from_status() {
        assert!(Error::status(408, "too slow").is_timeout());
        assert!(!Error::status(500, "boom").is_timeout());
    }

    #[test]
    fn test_abort_is_not_timeout() {
        assert!(Error::Aborted.is_abort());
        assert!(!Error::Aborted.is_timeout());
    }
}
