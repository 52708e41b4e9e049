//! Error types for permission resolution and synchronization

use thiserror::Error;

/// Access subsystem errors
///
/// These never reach query callers: the synchronizer and resolver absorb them
/// and surface plain booleans. They are kept for diagnostics and logging.
#[derive(Debug, Error)]
pub enum AccessError {
    /// No credential is held by the session
    #[error("No credential present")]
    Unauthenticated,

    /// The backend refused the credential (401/403)
    #[error("Credential rejected by backend: {0}")]
    CredentialRejected(String),

    /// Connection, timeout or other transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success status from the backend
    #[error("Unexpected status {code}: {message}")]
    Status { code: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Module catalog could not be loaded
    #[error("Module catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by diagnostics and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unauthenticated,
    CredentialRejected,
    SyncFailure,
    CatalogUnavailable,
}

impl AccessError {
    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unauthenticated => FailureKind::Unauthenticated,
            Self::CredentialRejected(_) => FailureKind::CredentialRejected,
            Self::CatalogUnavailable(_) => FailureKind::CatalogUnavailable,
            _ => FailureKind::SyncFailure,
        }
    }

    /// Whether the backend has rejected the credential outright.
    ///
    /// A rejected credential must be evicted; retrying with it is pointless.
    pub fn is_credential_rejected(&self) -> bool {
        matches!(self, Self::CredentialRejected(_))
    }
}

impl From<serde_json::Error> for AccessError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

/// Result type for access operations
pub type Result<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(AccessError::Unauthenticated.kind(), FailureKind::Unauthenticated);
        assert_eq!(
            AccessError::CredentialRejected("401".into()).kind(),
            FailureKind::CredentialRejected
        );
        assert_eq!(
            AccessError::Status { code: 502, message: "bad gateway".into() }.kind(),
            FailureKind::SyncFailure
        );
        assert_eq!(
            AccessError::MalformedPayload("missing Role".into()).kind(),
            FailureKind::SyncFailure
        );
        assert_eq!(
            AccessError::CatalogUnavailable("timeout".into()).kind(),
            FailureKind::CatalogUnavailable
        );
    }

    #[test]
    fn test_json_error_is_malformed_payload() {
        let err: AccessError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, AccessError::MalformedPayload(_)));
        assert!(!err.is_credential_rejected());
    }
}
