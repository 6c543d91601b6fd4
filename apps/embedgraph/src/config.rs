//! # Config Loading
//!
//! Resolves the index configuration for a run: the `--config` flag wins,
//! then `EMBEDGRAPH_CONFIG`, then the defaults (index every scalar field).

use crate::error::AppError;
use crate::input::{self, MAX_CONFIG_FILE_SIZE};
use embedgraph_core::GraphConfig;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "EMBEDGRAPH_CONFIG";

/// Pick the config path from the flag or the environment.
pub fn resolve_path(flag: Option<&Path>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .filter(|path| !path.as_os_str().is_empty())
}

/// Parse TOML text into a `GraphConfig`. `path` is only used in errors.
pub fn parse(text: &str, path: &Path) -> Result<GraphConfig, AppError> {
    toml::from_str(text).map_err(|source| AppError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config for a run.
pub fn load(flag: Option<&Path>) -> Result<GraphConfig, AppError> {
    let Some(path) = resolve_path(flag) else {
        tracing::debug!("no config given, indexing every field");
        return Ok(GraphConfig::default());
    };

    let text = input::read_to_string(&path, MAX_CONFIG_FILE_SIZE)?;
    let config = parse(&text, &path)?;
    tracing::info!(
        path = %path.display(),
        restricted_namespaces = config.namespaces.len(),
        "config loaded"
    );
    Ok(config)
}
