//! Error types for the synchronizer.

use rig_db::error::DatabaseError;
use thiserror::Error;

/// Errors surfaced by a reconciliation fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Short-lived network or lock failure. Retried with backoff.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The session may not read the store. Never retried.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other failure. Never retried.
    #[error("Reconciliation failed: {0}")]
    Fatal(String),
}

impl SyncError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<DatabaseError> for SyncError {
    fn from(e: DatabaseError) -> Self {
        if e.is_transient() {
            return Self::Transient(e.to_string());
        }
        match e {
            DatabaseError::PermissionDenied(msg) => Self::PermissionDenied(msg),
            other => Self::Fatal(other.to_string()),
        }
    }
}
