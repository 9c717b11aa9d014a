//! Observability for recordspace
//!
//! Structured JSON logging and operation scopes.
//!
//! # Principles
//!
//! 1. Observability is read-only and never fails an operation
//! 2. Output is deterministic (sorted field keys)
//! 3. Plaintext values of hashed fields are never logged
//!
//! ```ignore
//! use recordspace::observability::{Logger, ObservationScope};
//!
//! Logger::info("RECORD_CREATED", &[("record_space", "customers")]);
//! let scope = ObservationScope::new("COMMAND_COMPILE");
//! scope.complete();
//! ```

mod logger;
mod scope;

pub use logger::{Logger, Severity};
pub use scope::ObservationScope;
