//! CLI module for recordspace
//!
//! Provides command-line interface for:
//! - init: Create directory structure
//! - compile: One-shot compilation of a request (explain-style)
//! - start: Load record spaces and serve JSON-lines requests

mod args;
mod commands;
mod errors;
mod handler;
mod io;
mod request;

pub use args::{Cli, Command};
pub use commands::{compile, init, run, run_command, start, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use handler::{explain, handle, Response};
pub use io::{read_request, read_requests, write_error, write_errors, write_response};
pub use request::{CreateRequest, QueryRequest, Request, UpdateRequest};
