//! Error types for catalog operations.
//!
//! Errors are categorized so callers can decide which failures are worth
//! retrying.

use std::fmt;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of catalog errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport failures, throttling and server errors (transient, retryable).
    Network,
    /// Request rejected by the catalog (bad payload, conflict, auth).
    Client,
    /// Resource not found.
    NotFound,
    /// Response body did not have the expected shape.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Catalog unreachable or overloaded",
            Self::Client => "Request rejected by the catalog",
            Self::NotFound => "Resource not found",
            Self::Format => "Unexpected response from the catalog",
            Self::Other => "Unexpected error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the catalog.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The catalog answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A record addressed by id does not exist.
    #[error("{collection} record {id} not found")]
    NotFound {
        /// Collection path.
        collection: String,
        /// Requested id.
        id: String,
    },

    /// Invalid response from the API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Create an HTTP status error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code, if the catalog answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Transport(_) | Self::InvalidResponse(_) => None,
        }
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http { status: 404, .. } | Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Http { status: 429, .. } => ErrorCategory::Network,
            Self::Http { status, .. } if *status >= 500 => ErrorCategory::Network,
            Self::Http { status, .. } if *status >= 400 => ErrorCategory::Client,
            Self::Http { .. } => ErrorCategory::Other,
            Self::Transport(_) => ErrorCategory::Network,
            Self::InvalidResponse(_) => ErrorCategory::Format,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::http(code, format!("HTTP {code}")),
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Client.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Format.is_retryable());
        assert!(!ErrorCategory::Other.is_retryable());
    }

    #[test]
    fn test_http_status_categories() {
        assert_eq!(Error::http(503, "down").category(), ErrorCategory::Network);
        assert_eq!(Error::http(429, "slow down").category(), ErrorCategory::Network);
        assert_eq!(Error::http(400, "bad").category(), ErrorCategory::Client);
        assert_eq!(Error::http(409, "conflict").category(), ErrorCategory::Client);
        assert_eq!(Error::http(404, "gone").category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_transport_is_retryable() {
        let err = Error::Transport("connection reset".to_string());
        assert!(err.is_retryable());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_not_found_reports_404() {
        let err = Error::NotFound {
            collection: "events".to_string(),
            id: "ev-1".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("ev-1"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[test]
    fn test_error_category_display() {
        assert!(ErrorCategory::Network.to_string().contains("unreachable"));
    }
}
