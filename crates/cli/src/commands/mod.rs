pub mod routes;
pub mod run;

use anyhow::{Context, Result};
use prerender_core::{Config, load_config};
use std::path::{Path, PathBuf};

/// Load prerender.toml (if any) and apply environment overrides
fn resolve_config(root: &Path, config: Option<PathBuf>) -> Result<Config> {
    if !root.is_dir() {
        anyhow::bail!("Project root does not exist: {}", root.display());
    }

    let mut config = load_config(root, config.as_deref()).context("Failed to load configuration")?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}
