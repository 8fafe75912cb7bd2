//! Configuration and data directory paths
//!
//! Uses XDG directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/woo-console/`, `~/.cache/woo-console/`
//! - macOS: `~/Library/Application Support/woo-console/`, `~/Library/Caches/woo-console/`
//! - Windows: `%APPDATA%\woo-console\`, `%LOCALAPPDATA%\woo-console\`

use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) const APP_NAME: &str = "woo-console";

/// Get the application config directory, creating it if needed
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
    Ok(dir)
}

/// Get the application cache directory, creating it if needed
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create cache directory: {:?}", dir))?;
    Ok(dir)
}

/// Get path to the persisted session
pub fn session_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("session.toml"))
}

/// Directory for release-build log files
pub fn log_dir() -> Result<PathBuf> {
    let dir = cache_dir()?.join("logs");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
