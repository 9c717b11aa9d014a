//! # Crypto Errors

use thiserror::Error;

/// Result type for hashing operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Hashing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Hash parameters rejected by Argon2
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Hash computation failed
    #[error("Internal error: hashing failed")]
    HashingFailed,

    /// Blocking hash task did not complete
    #[error("Internal error: hashing task failed: {0}")]
    TaskFailed(String),
}

impl CryptoError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        500
    }
}
