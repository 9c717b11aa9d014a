//! Compiler errors
//!
//! Query compilation fails on the first error. Command compilation either
//! fails fatally on a duplicate value or rejects with every accumulated error.

use thiserror::Error;
use uuid::Uuid;

/// Result type for query compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors raised while compiling queries and commands
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// Request references a field absent from the schema
    #[error("Field '{key}' does not exist for {record_space}, existing fields are \"{existing}\"")]
    UnknownField {
        key: String,
        record_space: String,
        existing: String,
    },

    /// Type coercion of a query value failed
    #[error("Malformed value for '{field}': {reason}")]
    MalformedValue { field: String, reason: String },

    /// Required field omitted with no default
    #[error("Compulsory field '{field}' should be set")]
    MissingRequiredField { field: String },

    /// Value present but of the wrong runtime type
    #[error("'{field}' must be {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    /// Uniqueness violation
    #[error("A similar value already exists for unique field '{field}'")]
    DuplicateValue { field: String, conflicting_record: Uuid },

    /// Malformed record id in a query
    #[error("Invalid record identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Uniqueness checker or hasher failed
    #[error("Collaborator failure: {0}")]
    Collaborator(String),
}

impl CompileError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::UnknownField { .. } => "UNKNOWN_FIELD",
            CompileError::MalformedValue { .. } => "MALFORMED_VALUE",
            CompileError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            CompileError::TypeMismatch { .. } => "TYPE_MISMATCH",
            CompileError::DuplicateValue { .. } => "DUPLICATE_VALUE",
            CompileError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            CompileError::Collaborator(_) => "COLLABORATOR_FAILURE",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CompileError::DuplicateValue { .. } => 409,
            CompileError::Collaborator(_) => 500,
            _ => 400,
        }
    }

    /// Fatal errors stop command compilation immediately
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CompileError::DuplicateValue { .. } | CompileError::Collaborator(_)
        )
    }
}

/// Why a command did not compile
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandRejection {
    /// A single fatal error; nothing else is reported
    #[error("{0}")]
    Fatal(CompileError),

    /// Every omission, type and unknown-field error found in the body
    #[error("{}", join_messages(.0))]
    Rejected(Vec<CompileError>),
}

impl CommandRejection {
    pub fn errors(&self) -> Vec<&CompileError> {
        match self {
            CommandRejection::Fatal(error) => vec![error],
            CommandRejection::Rejected(errors) => errors.iter().collect(),
        }
    }

    /// Human-readable messages, one per error
    pub fn messages(&self) -> Vec<String> {
        self.errors().iter().map(|e| e.to_string()).collect()
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, CommandRejection::Fatal(_))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            CommandRejection::Fatal(error) => error.status_code(),
            CommandRejection::Rejected(_) => 400,
        }
    }

    /// Comma-separated codes for log lines
    pub fn codes(&self) -> String {
        self.errors()
            .iter()
            .map(|e| e.code())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn join_messages(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
