//! Configuration loading for nadir.
//! Reads nadir.toml from the current directory or the path in NADIR_CONFIG.
//! `.yaml` / `.yml` / `.json` files are accepted as well.

use std::path::{Path, PathBuf};

use anyhow::Context;

use nadir_common::StudyConfig;

pub const CONFIG_ENV: &str = "NADIR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "nadir.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: StudyConfig,
    /// `None` when no file was found and the defaults are in use.
    pub source: Option<PathBuf>,
}

pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load and validate `path`, falling back to the defaults when it does not exist.
///
/// Relative input and output paths are resolved against the directory holding
/// the file, so a config can travel with its data.
pub fn load_from(path: &Path) -> anyhow::Result<LoadedConfig> {
    if !path.exists() {
        let config = StudyConfig::default();
        config.validate().context("built-in defaults are invalid")?;
        return Ok(LoadedConfig { config, source: None });
    }

    let mut config = StudyConfig::from_path(path)
        .with_context(|| format!("Could not parse {}", path.display()))?;

    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config.inputs.resolve_relative_to(base);
    if config.output.dir.is_relative() {
        config.output.dir = base.join(&config.output.dir);
    }

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(LoadedConfig { config, source: Some(path.to_path_buf()) })
}

#[cfg(test)]
mod tests;
