//! # Application Errors
//!
//! Everything the binary can fail on. Store errors keep their own type and
//! are wrapped, not flattened into strings.

use embedgraph_core::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum AppError {
    /// Reading an input file failed.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing results failed.
    #[error("cannot write output: {0}")]
    Output(#[source] std::io::Error),

    /// An input file is over its size limit.
    #[error("'{}' is {size} bytes, limit is {limit}", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// A script is not valid JSON, does not match the step schema, or has
    /// too many steps.
    #[error("invalid script: {0}")]
    Json(#[from] serde_json::Error),

    /// A step parsed but its values cannot become store values.
    #[error("step {step}: {message}")]
    Script { step: usize, message: String },

    /// The index configuration file is malformed.
    #[error("invalid config '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A store operation failed while running with `--fail-fast`.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
