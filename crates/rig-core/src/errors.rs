//! Cross-cutting error types for Rigcheck.
//!
//! Store- and sync-specific errors (`DatabaseError`, `SyncError`) live in their
//! own crates. The CLI converges everything through `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any Rigcheck crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// A submission failed input validation and was not persisted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The acting user's role does not allow the action.
    #[error("Permission denied: role '{role}' cannot {action}")]
    PermissionDenied { role: String, action: String },

    /// The checklist catalog is malformed.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
