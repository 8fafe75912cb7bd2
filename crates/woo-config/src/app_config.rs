//! Application configuration
//!
//! Configuration loaded from `.woo-console.toml`.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Application configuration loaded from `.woo-console.toml`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Address of the store the console signs in to by default
    #[serde(default = "default_site_address")]
    pub site_address: String,

    /// Username offered when `login` is given no arguments
    #[serde(default)]
    pub username: Option<String>,

    /// Log level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON file with canned API responses (offline mode)
    #[serde(default)]
    pub fixtures_path: Option<String>,

    /// Log every dispatched action at debug level
    #[serde(default = "default_log_actions")]
    pub log_actions: bool,

    /// Worker threads of the runtime executing network requests
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

fn default_site_address() -> String {
    "https://example.com".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_actions() -> bool {
    true
}

fn default_worker_threads() -> usize {
    2
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_address: default_site_address(),
            username: None,
            log_level: default_log_level(),
            fixtures_path: None,
            log_actions: default_log_actions(),
            worker_threads: default_worker_threads(),
        }
    }
}

impl AppConfig {
    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }

    /// Configured log level, falling back to `Info` on unknown names
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}
