//! Command line configuration.
//!
//! Settings live in a small JSON file at `<config_dir>/apiplan/config.json`
//! (`~/.config/apiplan/config.json` on most platforms), or wherever
//! `APIPLAN_CONFIG_PATH` points. A missing file means defaults.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use apiplan_api::{ClientConfig, RetryPolicy};
use apiplan_util::expand_tilde;
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "APIPLAN_CONFIG_PATH";
/// Environment variable overriding the catalog directory.
pub const CATALOG_DIR_ENV: &str = "APIPLAN_CATALOG_DIR";

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Directory holding one `<alias>.json` catalog per learned API.
    pub catalog_dir: Option<String>,
    pub http: HttpSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_multiplier: 2,
        }
    }
}

impl AgentConfig {
    /// Loads the config from its default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(error) => return Err(error).with_context(|| format!("failed to read config {}", path.display())),
        };
        serde_json::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Catalog directory: `APIPLAN_CATALOG_DIR`, then the config file, then
    /// `<config_dir>/apiplan/catalogs`.
    pub fn catalog_dir(&self) -> PathBuf {
        if let Some(dir) = env::var(CATALOG_DIR_ENV).ok().filter(|dir| !dir.trim().is_empty()) {
            return expand_tilde(&dir);
        }
        match &self.catalog_dir {
            Some(dir) if !dir.trim().is_empty() => expand_tilde(dir),
            _ => apiplan_dir().join("catalogs"),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.http.max_attempts.max(1),
                initial_backoff: Duration::from_millis(self.http.initial_backoff_ms),
                multiplier: self.http.backoff_multiplier,
            },
        }
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }
    apiplan_dir().join(CONFIG_FILE_NAME)
}

fn apiplan_dir() -> PathBuf {
    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("apiplan")
}
