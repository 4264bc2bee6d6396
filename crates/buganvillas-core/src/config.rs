//! Application configuration management.
//!
//! This module handles loading and saving the console configuration: the
//! backend base URL, timeouts, where the session is persisted and which
//! routes the guard protects.
//!
//! Configuration is stored at `~/.config/buganvillas-admin/config.json`.
//! `BUGANVILLAS_API_URL` and `BUGANVILLAS_DATA_DIR` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::guard::RouteTable;

/// Application name used for config/data directory paths
const APP_NAME: &str = "buganvillas-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing else is configured (local development server)
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Upper bound on the whole HTTP exchange for any request
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Login and refresh give up sooner so the UI is never stuck loading
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 15;

pub const ENV_API_URL: &str = "BUGANVILLAS_API_URL";
pub const ENV_DATA_DIR: &str = "BUGANVILLAS_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub auth_timeout_secs: u64,
    /// Reject logins whose user record is not an administrator, on top of
    /// the backend's own check
    pub require_admin_role: bool,
    pub data_dir: Option<PathBuf>,
    pub last_email: Option<String>,
    pub routes: RouteTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auth_timeout_secs: DEFAULT_AUTH_TIMEOUT_SECS,
            require_admin_role: false,
            data_dir: None,
            last_email: None,
            routes: RouteTable::default(),
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session and cookie jar
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
