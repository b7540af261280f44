//! Database error types for rig-db.

use rig_core::errors::CoreError;
use thiserror::Error;

use crate::retry::is_transient_libsql_error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input was rejected before anything was written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The acting role may not perform this action.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A multi-row write failed part-way and was rolled back. The caller
    /// should retry the whole operation.
    #[error("Integrity fault while writing {stage}: {reason} (nothing was persisted, retry the whole submission)")]
    Integrity { stage: String, reason: String },

    /// A conditional transition found the record in an unexpected state.
    #[error("Conflict on {id}: expected status {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: String,
        actual: String,
    },

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether retrying the same call may succeed without any change on
    /// the caller's side.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LibSql(e) if is_transient_libsql_error(e))
    }

    pub(crate) fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn integrity(stage: &str, source: impl std::fmt::Display) -> Self {
        Self::Integrity {
            stage: stage.to_string(),
            reason: source.to_string(),
        }
    }
}

impl From<CoreError> for DatabaseError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound { entity_type, id } => Self::NotFound {
                entity: entity_type,
                id,
            },
            CoreError::Validation(msg) => Self::Validation(msg),
            e @ CoreError::PermissionDenied { .. } => Self::PermissionDenied(e.to_string()),
            e @ (CoreError::InvalidTransition { .. } | CoreError::Catalog(_)) => {
                Self::InvalidState(e.to_string())
            }
            CoreError::Other(e) => Self::Other(e),
        }
    }
}
