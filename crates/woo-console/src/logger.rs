//! File-based logging using simplelog
//!
//! Log file location depends on build type:
//! - Debug builds: current working directory (for development convenience)
//! - Release builds: cache directory (~/.cache/woo-console/logs/ on Linux)

use anyhow::{Context, Result};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

/// Get the log file path based on build type
fn log_file_path() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let filename = format!("woo-console-{}.log", timestamp);

    if cfg!(debug_assertions) {
        PathBuf::from(filename)
    } else {
        woo_config::paths::log_dir()
            .map(|dir| dir.join(&filename))
            .unwrap_or_else(|_| PathBuf::from(filename))
    }
}

/// Level from `RUST_LOG` if set and valid, `configured` otherwise
fn level_from_env(configured: LevelFilter) -> LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(configured)
}

/// Initialize file-based logging
///
/// Returns the path of the log file.
pub fn init(configured: LevelFilter) -> Result<PathBuf> {
    let log_file = log_file_path();
    let level = level_from_env(configured);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|c| c)
        .build();

    let file = File::create(&log_file)
        .with_context(|| format!("Failed to create log file: {:?}", log_file))?;
    WriteLogger::init(level, config, file).context("Failed to initialize logger")?;

    Ok(log_file)
}
