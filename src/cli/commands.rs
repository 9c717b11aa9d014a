//! CLI command implementations
//!
//! - init: create the data directory layout
//! - compile: compile one stdin request and print the compiled form
//! - start: load record spaces, then serve JSON-lines requests from stdin

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::crypto::{Argon2Hasher, HashingConfig};
use crate::observability::{Logger, Severity};
use crate::records::RecordService;
use crate::schema::SchemaLoader;
use crate::store::MemoryRecordStore;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::handler::{explain, handle};
use super::io::{read_request, read_requests, write_error, write_response};
use super::request::Request;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Argon2id cost for hashed fields (optional)
    #[serde(default)]
    pub hashing: HashingConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        self.severity()?;

        self.hashing
            .params()
            .map_err(|e| CliError::config_error(format!("Invalid hashing config: {}", e)))?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level.parse().map_err(CliError::config_error)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Compile { config } => compile(&config),
        Command::Start { config } => start(&config),
    }
}

/// Initialize a new data directory
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    let space_dir = SchemaLoader::new(data_dir).space_dir().to_path_buf();
    fs::create_dir_all(&space_dir).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", space_dir, e))
    })?;

    write_response(json!({"initialized": true}))?;

    Ok(())
}

/// Compile one request from stdin and print the compiled query and/or command
///
/// Commands are checked for uniqueness against an empty store.
pub fn compile(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let service = boot(&config)?;
    let request = Request::parse(read_request()?)?;

    let runtime = runtime()?;
    let response = runtime.block_on(explain(&service, request))?;
    response.write()
}

/// Serve JSON-lines requests from stdin until EOF
pub fn start(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let service = boot(&config)?;
    let runtime = runtime()?;

    Logger::info("SERVING", &[("data_dir", config.data_dir.as_str())]);

    for line in read_requests() {
        let request = match line.and_then(Request::parse) {
            Ok(request) => request,
            Err(e) => {
                write_error(e.code_str(), e.message())?;
                continue;
            }
        };

        let op = request.op();
        let response = runtime.block_on(handle(&service, request))?;
        if !response.is_success() {
            Logger::warn("REQUEST_FAILED", &[("op", op)]);
        }
        response.write()?;
    }

    Logger::info("SHUTDOWN", &[]);
    Ok(())
}

/// Load record spaces and wire the record service
fn boot(config: &Config) -> CliResult<RecordService> {
    Logger::set_min_severity(config.severity()?);

    let data_dir = config.data_path();
    if !is_initialized(data_dir) {
        return Err(CliError::not_initialized());
    }

    let mut loader = SchemaLoader::new(data_dir);
    loader
        .load_all()
        .map_err(|e| CliError::boot_failed(e.to_string()))?;

    let hasher = Argon2Hasher::new(&config.hashing)
        .map_err(|e| CliError::boot_failed(e.to_string()))?;

    Ok(RecordService::new(
        Arc::new(loader),
        Arc::new(MemoryRecordStore::new()),
        Arc::new(hasher),
    ))
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Check if data directory is initialized
fn is_initialized(data_dir: &Path) -> bool {
    SchemaLoader::new(data_dir).space_dir().exists()
}
