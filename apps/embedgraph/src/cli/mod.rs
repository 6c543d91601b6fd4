//! # embedgraph CLI Module
//!
//! This module implements the CLI interface for embedgraph.
//!
//! ## Available Commands
//!
//! - `run` - Execute a JSON script against a fresh store
//! - `check` - Parse and compile a script without executing it

mod commands;

use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// embedgraph - embedded entity/relationship store
///
/// Runs scripts of node, edge and search operations against an in-memory
/// store and prints one JSON outcome per step.
#[derive(Parser, Debug)]
#[command(name = "embedgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Index configuration file (TOML); defaults to $EMBEDGRAPH_CONFIG
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a script
    Run {
        /// Path to the script (JSON array of steps)
        #[arg(short, long)]
        file: PathBuf,

        /// Stop at the first failing step with a non-zero exit code
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate a script without executing it
    Check {
        /// Path to the script (JSON array of steps)
        #[arg(short, long)]
        file: PathBuf,
    },
}

impl Cli {
    /// Default `tracing` filter for the chosen verbosity.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "embedgraph=debug"
        } else if self.quiet {
            "embedgraph=warn"
        } else {
            "embedgraph=info"
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments, writing results to stdout.
pub fn execute(cli: Cli) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Run { file, fail_fast } => cmd_run(
            &file,
            cli.config.as_deref(),
            fail_fast,
            cli.pretty,
            &mut stdout,
        ),
        Commands::Check { file } => cmd_check(&file, cli.pretty, &mut stdout),
    }
}
