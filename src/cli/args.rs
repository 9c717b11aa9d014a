//! CLI argument definitions using clap
//!
//! Commands:
//! - recordspace init --config <path>
//! - recordspace compile --config <path>
//! - recordspace start --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// recordspace - schema-driven record query and command compiler
#[derive(Parser, Debug)]
#[command(name = "recordspace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./recordspace.json")]
        config: PathBuf,
    },

    /// Compile one request read from stdin and print the result
    Compile {
        /// Path to configuration file
        #[arg(long, default_value = "./recordspace.json")]
        config: PathBuf,
    },

    /// Serve JSON-lines requests from stdin
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./recordspace.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
