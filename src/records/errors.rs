//! Record service errors

use thiserror::Error;

use crate::compiler::{CommandRejection, CompileError};
use crate::crypto::CryptoError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Result type for record service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the record service
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// Query could not be compiled
    #[error("{0}")]
    Query(#[from] CompileError),

    /// Body was rejected by the command compiler
    #[error("{0}")]
    Command(#[from] CommandRejection),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Crypto(#[from] CryptoError),
}

impl ServiceError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Schema(e) => e.code().code(),
            ServiceError::Query(e) => e.code(),
            ServiceError::Command(CommandRejection::Fatal(e)) => e.code(),
            ServiceError::Command(CommandRejection::Rejected(_)) => "COMMAND_REJECTED",
            ServiceError::Store(_) => "STORE_ERROR",
            ServiceError::Crypto(_) => "CRYPTO_ERROR",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Schema(e) => e.code().status_code(),
            ServiceError::Query(e) => e.status_code(),
            ServiceError::Command(e) => e.status_code(),
            ServiceError::Store(e) => e.status_code(),
            ServiceError::Crypto(e) => e.status_code(),
        }
    }

    /// Every message a caller should see, one per problem
    pub fn messages(&self) -> Vec<String> {
        match self {
            ServiceError::Command(rejection) => rejection.messages(),
            other => vec![other.to_string()],
        }
    }
}
