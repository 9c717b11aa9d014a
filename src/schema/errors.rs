//! Schema error types
//!
//! Error codes:
//! - RECORD_SPACE_NOT_FOUND (REJECT)
//! - RECORD_SPACE_EXISTS (REJECT)
//! - RECORD_SPACE_MALFORMED (REJECT, FATAL when hit while loading from disk)
//! - RECORD_SPACE_INVALID_SEARCHABLE_FIELDS (REJECT)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// Startup cannot continue
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// No record space with the given slug or id
    RecordSpaceNotFound,
    /// A record space with the same slug is already registered
    RecordSpaceExists,
    /// Record space definition violates structural rules
    RecordSpaceMalformed,
    /// Record space file could not be read or parsed at startup
    RecordSpaceUnreadable,
    /// Searchable field list names fields absent from the space
    InvalidSearchableFields,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::RecordSpaceNotFound => "RECORD_SPACE_NOT_FOUND",
            SchemaErrorCode::RecordSpaceExists => "RECORD_SPACE_EXISTS",
            SchemaErrorCode::RecordSpaceMalformed => "RECORD_SPACE_MALFORMED",
            SchemaErrorCode::RecordSpaceUnreadable => "RECORD_SPACE_UNREADABLE",
            SchemaErrorCode::InvalidSearchableFields => "RECORD_SPACE_INVALID_SEARCHABLE_FIELDS",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::RecordSpaceUnreadable => Severity::Fatal,
            _ => Severity::Reject,
        }
    }

    /// HTTP-style status for transports
    pub fn status_code(&self) -> u16 {
        match self {
            SchemaErrorCode::RecordSpaceNotFound => 404,
            SchemaErrorCode::RecordSpaceExists => 409,
            SchemaErrorCode::RecordSpaceMalformed => 400,
            SchemaErrorCode::InvalidSearchableFields => 400,
            SchemaErrorCode::RecordSpaceUnreadable => 500,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Record space slug or id if applicable
    record_space: Option<String>,
}

impl SchemaError {
    /// Create a record space not found error
    pub fn not_found(record_space: impl Into<String>) -> Self {
        let space = record_space.into();
        Self {
            code: SchemaErrorCode::RecordSpaceNotFound,
            message: format!("Record space '{}' does not exist", space),
            record_space: Some(space),
        }
    }

    /// Create a duplicate record space error
    pub fn already_exists(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            code: SchemaErrorCode::RecordSpaceExists,
            message: format!("Record space with slug '{}' already exists", slug),
            record_space: Some(slug),
        }
    }

    /// Create a malformed record space error
    pub fn malformed(slug: impl Into<String>, reason: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            code: SchemaErrorCode::RecordSpaceMalformed,
            message: format!("Record space '{}' is malformed: {}", slug, reason.into()),
            record_space: Some(slug),
        }
    }

    /// Create an error for an unreadable record space file
    pub fn unreadable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::RecordSpaceUnreadable,
            message: format!("Record space file '{}': {}", path.into(), reason.into()),
            record_space: None,
        }
    }

    /// Create an invalid searchable fields error
    pub fn invalid_searchable_fields(slug: impl Into<String>, invalid: &[String]) -> Self {
        let slug = slug.into();
        Self {
            code: SchemaErrorCode::InvalidSearchableFields,
            message: format!(
                "Following fields: {} do not exist for record space: {}, please check the fields and try again",
                invalid.join(", "),
                slug
            ),
            record_space: Some(slug),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the record space if applicable
    pub fn record_space(&self) -> Option<&str> {
        self.record_space.as_deref()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
