//! Error types for the quiz core.
//!
//! `QuizError` covers everything the session engine, content cache and sync
//! engine can report. `RemoteError` classifies failures of a remote store or
//! question generator; implementations return it wrapped in `anyhow::Error`
//! so callers can downcast without string matching.

use thiserror::Error;

use crate::model::Category;

/// Errors raised by the quiz core.
#[derive(Debug, Error)]
pub enum QuizError {
    /// A round could not be built because the content pool is empty.
    #[error("not enough content to start a round in category '{category}'")]
    InsufficientContent { category: Category },

    /// An entity failed shape validation on load.
    #[error("malformed {kind} entity {id}: {reason}")]
    MalformedEntity {
        kind: &'static str,
        id: String,
        reason: String,
    },

    /// The remote store could not be reached or rejected the request.
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// A presentation index outside the displayed options.
    #[error("option {index} is out of range ({available} options)")]
    InvalidOption { index: usize, available: usize },

    /// An operation that the current session phase does not accept.
    #[error("cannot {operation} while the session is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: String,
    },

    /// The session already produced its result.
    #[error("session is closed")]
    SessionClosed,

    /// A learning unit id that does not belong to the module.
    #[error("unit '{unit_id}' not found in module '{module_id}'")]
    UnknownUnit { module_id: String, unit_id: String },

    /// A learning unit whose predecessor is not yet complete.
    #[error("unit '{unit_id}' is locked until the previous unit is complete")]
    UnitLocked { unit_id: String },

    /// Local storage failed.
    #[error("local storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// An entity could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QuizError {
    /// Build a `MalformedEntity` error.
    pub fn malformed(kind: &'static str, id: impl Into<String>, reason: impl Into<String>) -> Self {
        QuizError::MalformedEntity {
            kind,
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Classify an error returned by a remote collaborator.
    pub fn remote(err: &anyhow::Error) -> Self {
        QuizError::RemoteUnavailable(format!("{err:#}"))
    }
}

/// Errors returned by remote stores and question generators.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Authentication failed (invalid or missing API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested collection or document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred, or the store is offline.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl RemoteError {
    /// Returns `true` if retrying on the next start cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            RemoteError::AuthenticationFailed(_) | RemoteError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_classification_keeps_message() {
        let err: anyhow::Error = RemoteError::NetworkError("connection refused".into()).into();
        let classified = QuizError::remote(&err);
        assert!(matches!(classified, QuizError::RemoteUnavailable(_)));
        assert!(classified.to_string().contains("connection refused"));
    }

    #[test]
    fn permanent_errors() {
        assert!(RemoteError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(!RemoteError::Timeout(30).is_permanent());
        assert!(!RemoteError::ApiError {
            status: 503,
            message: "busy".into()
        }
        .is_permanent());
    }
}
