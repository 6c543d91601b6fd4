//! # embedgraph
//!
//! The binary front end for the embedgraph in-memory store.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                apps/embedgraph (THE BINARY)            │
//! │                                                        │
//! │   ┌─────────────┐   ┌──────────────┐   ┌───────────┐   │
//! │   │    CLI      │──▶│   Script     │──▶│  Config   │   │
//! │   │   (clap)    │   │ (serde_json) │   │  (toml)   │   │
//! │   └─────────────┘   └──────┬───────┘   └───────────┘   │
//! │                            ▼                           │
//! │                   ┌─────────────────┐                  │
//! │                   │ embedgraph-core │                  │
//! │                   │   (THE STORE)   │                  │
//! │                   └─────────────────┘                  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Validate a script
//! embedgraph check -f employees.json
//!
//! # Run it with a restricted index
//! embedgraph run -f employees.json -c embedgraph.toml
//!
//! # JSON logs on stderr
//! EMBEDGRAPH_LOG_FORMAT=json RUST_LOG=embedgraph=debug embedgraph run -f employees.json
//! ```

use clap::Parser;
use embedgraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // EMBEDGRAPH_LOG_FORMAT=json enables machine-parseable output.
    // Logs go to stderr; stdout carries step outcomes.
    let log_format =
        std::env::var("EMBEDGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.default_log_filter().into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
