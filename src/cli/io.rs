//! JSON I/O handling for CLI
//!
//! - Input: one JSON object per line on stdin
//! - Output: one JSON object per line on stdout
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Value> {
    let stdin = io::stdin();
    let mut line = String::new();

    stdin.lock().read_line(&mut line)?;

    if line.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    let value: Value = serde_json::from_str(&line)?;
    Ok(value)
}

/// Read JSON requests from stdin, one per line; blank lines are skipped
pub fn read_requests() -> impl Iterator<Item = CliResult<Value>> {
    let stdin = io::stdin();
    stdin
        .lock()
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|line| {
            let line = line.map_err(CliError::from)?;
            serde_json::from_str(&line)
                .map_err(|e| CliError::invalid_request(format!("Invalid JSON: {}", e)))
        })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&json!({
        "status": "ok",
        "data": data
    }))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_errors(code, &[message.to_string()])
}

/// Write an error response carrying every message of a rejected request
pub fn write_errors(code: &str, messages: &[String]) -> CliResult<()> {
    write_line(&json!({
        "status": "error",
        "code": code,
        "message": messages.join("; "),
        "errors": messages
    }))
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
