//! Repository errors - persistence failures before they reach callers

use crate::error::TuitionError;

/// Repository result type
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict on {field}: {message}")]
    Conflict { field: &'static str, message: String },

    #[error("storage error: {0}")]
    StorageError(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }
}

impl From<RepositoryError> for TuitionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => TuitionError::NotFound { entity, id },
            RepositoryError::Conflict { field, message } => TuitionError::conflict(field, message),
            RepositoryError::StorageError(message) => TuitionError::Storage(message),
        }
    }
}
