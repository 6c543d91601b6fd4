//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Results are written to the given writer; logs go through `tracing`.

use crate::config;
use crate::error::AppError;
use crate::script::{Action, Script};
use embedgraph_core::{Graph, GraphStore};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T, pretty: bool) -> Result<(), AppError> {
    let written = if pretty {
        serde_json::to_writer_pretty(&mut *out, value)
    } else {
        serde_json::to_writer(&mut *out, value)
    };
    written.map_err(|e| AppError::Output(e.into()))?;
    writeln!(out).map_err(AppError::Output)
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Execute a script against a fresh store, printing each step's outcome as
/// it completes. Outcomes already printed stay printed when fail-fast stops
/// the run.
pub fn cmd_run<W: Write>(
    file: &Path,
    config_path: Option<&Path>,
    fail_fast: bool,
    pretty: bool,
    out: &mut W,
) -> Result<(), AppError> {
    let config = config::load(config_path)?;
    let script = Script::load(file)?;
    tracing::info!(
        file = %file.display(),
        steps = script.steps().len(),
        "running script"
    );

    let mut graph = Graph::with_config(config);
    let mut steps = 0usize;
    let mut failed = 0usize;
    let ran = script.run_with(&mut graph, fail_fast, |outcome| {
        steps += 1;
        if !outcome.ok {
            failed += 1;
        }
        write_json(out, &outcome, pretty)
    });
    out.flush().map_err(AppError::Output)?;
    ran?;

    let metrics = graph.metrics();
    tracing::info!(
        steps,
        failed,
        nodes = metrics.node_count,
        edges = metrics.edge_count,
        "script finished"
    );

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Summary printed by `check`.
#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    file: &'a str,
    steps: usize,
    mutations: usize,
    queries: usize,
}

/// Parse and compile a script, printing a summary without executing it.
pub fn cmd_check<W: Write>(file: &Path, pretty: bool, out: &mut W) -> Result<(), AppError> {
    let script = Script::load(file)?;
    let actions = script.compile()?;

    let mutations = actions
        .iter()
        .filter(|action| matches!(action, Action::Mutate(_)))
        .count();
    let path = file.display().to_string();
    let report = CheckReport {
        file: &path,
        steps: actions.len(),
        mutations,
        queries: actions.len().saturating_sub(mutations),
    };

    tracing::info!(file = %path, steps = report.steps, "script is valid");
    write_json(out, &report, pretty)?;
    out.flush().map_err(AppError::Output)
}
