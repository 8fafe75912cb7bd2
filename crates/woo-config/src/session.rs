//! Session state persistence
//!
//! Remembers who is signed in and which site is selected across runs:
//! `~/.config/woo-console/session.toml`.
//!
//! The auth token is never written to disk.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::paths;

const SESSION_VERSION: u32 = 1;

/// Session metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub last_modified: DateTime<Utc>,
    pub version: u32,
}

/// Session data - the actual persisted state
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionData {
    pub username: Option<String>,
    pub site_address: Option<String>,
    pub default_account_id: Option<i64>,
    pub default_site_id: Option<i64>,
}

/// Complete session with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub meta: SessionMeta,
    #[serde(default)]
    pub session: SessionData,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            meta: SessionMeta {
                last_modified: Utc::now(),
                version: SESSION_VERSION,
            },
            session: SessionData::default(),
        }
    }
}

impl Session {
    /// Load the global session, or defaults if there is none
    pub fn load() -> Self {
        if let Ok(path) = paths::session_path() {
            if path.exists() {
                match Self::load_from_path(&path) {
                    Ok(session) => {
                        log::info!("Loaded session from {:?}", path);
                        return session;
                    }
                    Err(e) => log::warn!("Ignoring unreadable session: {:#}", e),
                }
            }
        }

        log::info!("No existing session found, using defaults");
        Self::default()
    }

    /// Load session from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {:?}", path))
    }

    /// Save session to specific path
    pub fn save_to_path(&mut self, path: &Path) -> Result<()> {
        self.meta.last_modified = Utc::now();
        let content = toml::to_string_pretty(self).context("Failed to serialize session")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write session file: {:?}", path))?;

        log::info!("Saved session to {:?}", path);
        Ok(())
    }

    /// Remember the signed-in user
    pub fn set_credentials(&mut self, username: &str, site_address: &str) {
        self.session.username = Some(username.to_string());
        self.session.site_address = Some(site_address.to_string());
    }

    pub fn set_default_account_id(&mut self, account_id: i64) {
        self.session.default_account_id = Some(account_id);
    }

    pub fn set_default_site_id(&mut self, site_id: i64) {
        self.session.default_site_id = Some(site_id);
    }

    pub fn default_account_id(&self) -> Option<i64> {
        self.session.default_account_id
    }

    pub fn default_site_id(&self) -> Option<i64> {
        self.session.default_site_id
    }

    pub fn username(&self) -> Option<&str> {
        self.session.username.as_deref()
    }

    /// Forget everything (sign-out)
    pub fn reset(&mut self) {
        self.session = SessionData::default();
    }
}
