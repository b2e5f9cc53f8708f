//! Error types for the persistence adapter.

use thiserror::Error;

use crate::editor::EditorError;

/// Errors returned by [`CanvasService`](crate::CanvasService) operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller supplied invalid input (empty title, bad color, ...).
    #[error("{0}")]
    Validation(String),

    /// The entity does not exist or is owned by another user.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A cascading delete would exceed the batch operation limit.
    ///
    /// Raised before any row is removed.
    #[error("cascading delete needs {operations} operations, limit is {limit}")]
    BatchLimitExceeded { operations: usize, limit: usize },

    /// The stored note content could not be edited as requested.
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored timestamp was out of range.
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] time::error::ComponentRange),
}

impl ServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Returns true for errors caused by the caller rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::BatchLimitExceeded { .. } | Self::Editor(_)
        )
    }
}

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
