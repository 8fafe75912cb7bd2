//! Configuration and file management for woo-console
//!
//! This crate provides:
//! - Config and cache directory paths
//! - Configuration file loading (TOML)
//! - Application configuration (AppConfig)
//! - Session persistence (default account and site)

pub mod app_config;
pub mod config_file;
pub mod paths;
pub mod session;

pub use app_config::AppConfig;
pub use config_file::load_config_file;
pub use paths::{cache_dir, config_dir, session_path};
pub use session::Session;
