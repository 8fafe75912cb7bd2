use std::env;
use std::path::{Path, PathBuf};

use crate::paths::APP_NAME;

pub const CONFIG_FILE: &str = ".woo-console.toml";

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "WOO_CONSOLE_CONFIG";

/// Load config file content from the first place that has one
///
/// Searches in order:
/// 1. `$WOO_CONSOLE_CONFIG`, if set
/// 2. `.woo-console.toml` in the current working directory
/// 3. `config.toml` in the app config directory (`~/.config/woo-console/`)
/// 4. `.woo-console.toml` in the home directory
///
/// Returns the file content if found, None otherwise.
pub fn load_config_file() -> Option<String> {
    load_first(&candidates()).map(|(_, content)| content)
}

fn candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(explicit) = env::var_os(CONFIG_ENV) {
        paths.push(PathBuf::from(explicit));
    }
    paths.push(PathBuf::from(CONFIG_FILE));
    // not paths::config_dir(): looking must not create the directory
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_NAME).join("config.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(CONFIG_FILE));
    }
    paths
}

/// Read the first readable file of `paths`
fn load_first(paths: &[PathBuf]) -> Option<(PathBuf, String)> {
    paths.iter().find_map(|path| {
        let content = read(path)?;
        log::debug!("Loaded config from {}", path.display());
        Some((path.clone(), content))
    })
}

fn read(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            log::warn!("Skipping unreadable config {}: {}", path.display(), e);
            None
        }
    }
}
