//! Error types for reconciliation.
//!
//! Every error is fatal to the task that raised it. The task layer never
//! retries or downgrades; [`Error::is_retryable`] only informs callers that
//! choose to wrap a whole task invocation with [`crate::retry::with_retry`].

use std::fmt;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A version string did not follow semantic versioning.
    Version,
    /// The catalog returned more than one candidate for a unique name.
    Ambiguity,
    /// A remote catalog call failed.
    Remote,
    /// The remote catalog answered without a field it must always return.
    Contract,
    /// The requested reconciliation is not supported.
    Unsupported,
    /// Payload could not be serialized for comparison or submission.
    Serialization,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Version => "Invalid semantic version",
            Self::Ambiguity => "Ambiguous catalog lookup",
            Self::Remote => "Catalog request failed",
            Self::Contract => "Catalog response violated its contract",
            Self::Unsupported => "Unsupported reconciliation",
            Self::Serialization => "Payload serialization failed",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Version => "Versions must look like MAJOR.MINOR.PATCH, e.g. 1.4.0",
            Self::Ambiguity => "Remove or rename the duplicate resources in the catalog",
            Self::Remote => "Check the catalog URL, token and status details",
            Self::Contract => "Report the response to the catalog service owners",
            Self::Unsupported => "Remove the resource manually or set the target to present",
            Self::Serialization => "Check the document for values that cannot be encoded as JSON",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors raised while reconciling a resource.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed semantic version.
    #[error("invalid semantic version: '{version}'")]
    InvalidVersion {
        /// The offending version string.
        version: String,
    },

    /// Bumping would push a version component past its limit.
    #[error("cannot apply a {strategy} bump to version '{version}': component overflow")]
    VersionOverflow {
        /// The version being bumped.
        version: String,
        /// The requested bump strategy.
        strategy: String,
    },

    /// A name lookup within a scope returned more than one resource.
    #[error("{count} {kind} resources named '{name}' found{}", scope_suffix(.scope))]
    AmbiguousResource {
        /// Resource kind.
        kind: String,
        /// Looked-up name.
        name: String,
        /// Parent scope id, if the kind is scoped.
        scope: Option<String>,
        /// Number of matches.
        count: usize,
    },

    /// A remote catalog call failed.
    #[error("{operation} failed for {identity}: {message}{}", status_suffix(.status))]
    CatalogApi {
        /// Name of the originating operation (e.g. `create event`).
        operation: String,
        /// Display form of the resource identity.
        identity: String,
        /// HTTP-like status, if the remote answered.
        status: Option<u16>,
        /// Remote error details.
        message: String,
        /// Whether a repeat of the whole task may succeed.
        retryable: bool,
    },

    /// A required response field was absent.
    #[error("{operation} for {identity} returned no '{field}'")]
    MissingField {
        /// Name of the originating operation.
        operation: String,
        /// Display form of the resource identity.
        identity: String,
        /// Missing field name.
        field: String,
    },

    /// The requested target presence cannot be reconciled.
    #[error("reconciling {identity} to {target} is not supported")]
    Unsupported {
        /// Display form of the resource identity.
        identity: String,
        /// Requested target.
        target: String,
    },

    /// Payload could not be converted to JSON.
    #[error("failed to serialize {what}: {source}")]
    Serialization {
        /// What was being serialized.
        what: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

fn scope_suffix(scope: &Option<String>) -> String {
    scope
        .as_deref()
        .map(|s| format!(" in scope {s}"))
        .unwrap_or_default()
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl Error {
    /// Create an invalid version error.
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(
        operation: impl Into<String>,
        identity: impl fmt::Display,
        field: impl Into<String>,
    ) -> Self {
        Self::MissingField {
            operation: operation.into(),
            identity: identity.to_string(),
            field: field.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            what: what.into(),
            source,
        }
    }

    /// Get the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidVersion { .. } | Self::VersionOverflow { .. } => ErrorCategory::Version,
            Self::AmbiguousResource { .. } => ErrorCategory::Ambiguity,
            Self::CatalogApi { .. } => ErrorCategory::Remote,
            Self::MissingField { .. } => ErrorCategory::Contract,
            Self::Unsupported { .. } => ErrorCategory::Unsupported,
            Self::Serialization { .. } => ErrorCategory::Serialization,
        }
    }

    /// Whether repeating the whole task might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CatalogApi { retryable: true, .. })
    }
}
