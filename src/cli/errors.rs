//! Process-level failures of the `recordspace` binary
//!
//! A `CliError` ends the process with a non-zero exit. Failures of a single
//! request (bad body, unknown record space) never become a `CliError`; they
//! are written back as error responses and the request loop keeps going.

use std::io;

use thiserror::Error;

/// Stable codes printed with every CLI failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Config file missing, unparsable, or with invalid values
    ConfigError,
    /// stdin/stdout could not be read or written
    IoError,
    /// A request line is not valid JSON or names no known op
    InvalidRequest,
    /// `init` ran against a data directory that already has record spaces
    AlreadyInitialized,
    /// `compile`/`start` ran before `init`
    NotInitialized,
    /// Record spaces or the hasher could not be set up
    BootFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "RECORD_CLI_CONFIG_ERROR",
            Self::IoError => "RECORD_CLI_IO_ERROR",
            Self::InvalidRequest => "RECORD_CLI_INVALID_REQUEST",
            Self::AlreadyInitialized => "RECORD_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "RECORD_CLI_NOT_INITIALIZED",
            Self::BootFailed => "RECORD_CLI_BOOT_FAILED",
        }
    }
}

/// Failure that stops the binary
#[derive(Debug, Error)]
#[error("{}: {message}", .code.code())]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Request line rejected before it reached the record service
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Record space directory already exists; refusing to initialize again",
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "No record space directory found. Run 'recordspace init' first.",
        )
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Code string used in error responses
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

/// JSON failures at this layer come from reading or writing lines
impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// Result type for CLI commands
pub type CliResult<T> = Result<T, CliError>;
