//! # embedgraph
//!
//! Library side of the `embedgraph` binary: CLI definitions, script
//! compilation and execution, config loading and the app error type.

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod script;

pub use error::AppError;
pub use script::{Script, Step, StepOutcome};
