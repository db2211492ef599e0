//! Runtime configuration.
//!
//! Values come from `config.json` in the platform config directory, then
//! environment variables override individual fields:
//! - `CODEVAULT_DB` - database file path
//! - `CODEVAULT_MAX_PROJECTS` - project cap
//! - `CODEVAULT_PORT` - HTTP port for `cvault serve`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::db::DEFAULT_MAX_PROJECTS;

const CONFIG_FILE: &str = "config.json";
const DEFAULT_PORT: u16 = 17020;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VaultConfig {
    /// Database file. `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,
    /// Maximum number of projects the store will hold.
    pub max_projects: usize,
    pub port: u16,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_projects: DEFAULT_MAX_PROJECTS,
            port: DEFAULT_PORT,
        }
    }
}

impl VaultConfig {
    /// Load configuration from the user's config directory and the environment.
    /// Falls back to defaults if the file is missing or fails to parse.
    pub fn load() -> Self {
        let config = match config_path().and_then(|p| Self::from_file(&p)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Apply overrides from `lookup`, ignoring values that fail to parse.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup("CODEVAULT_DB").filter(|s| !s.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(max) = lookup("CODEVAULT_MAX_PROJECTS").and_then(|s| s.trim().parse().ok()) {
            self.max_projects = max;
        }
        if let Some(port) = lookup("CODEVAULT_PORT").and_then(|s| s.trim().parse().ok()) {
            self.port = port;
        }
        self
    }

    /// Save the configuration to the user's config directory.
    pub fn save(&self) -> Result<()> {
        let path = config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;
        Ok(())
    }
}

fn config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "codevault")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}
