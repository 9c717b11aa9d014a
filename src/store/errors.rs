//! Record store errors

use thiserror::Error;
use uuid::Uuid;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No record with this id
    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),

    /// Lock poisoned by a panicking writer
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// Collaborator failed while checking a constraint
    #[error("Constraint check failed: {0}")]
    ConstraintCheck(String),
}

impl StoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::RecordNotFound(_) => 404,
            StoreError::Unavailable(_) => 503,
            StoreError::ConstraintCheck(_) => 500,
        }
    }
}
