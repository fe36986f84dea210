//! Configuration loading and management.

use anyhow::Result;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix for display task numbers (the `PROJ` in `PROJ-001`).
    #[serde(default = "default_project_key")]
    pub project_key: String,

    /// Default page size for listings and search.
    #[serde(default = "default_page_limit")]
    pub page_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            project_key: default_project_key(),
            page_limit: default_page_limit(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".bugtrack/tracker.db")
}

fn default_project_key() -> String {
    "PROJ".to_string()
}

fn default_page_limit() -> i64 {
    100
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default locations or return defaults.
    ///
    /// Order: `.bugtrack/config.yaml` in the working directory, then the
    /// user config dir, then environment variable overrides on defaults.
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::load(".bugtrack/config.yaml") {
            return config;
        }

        if let Some(dir) = dirs::config_dir() {
            if let Ok(config) = Self::load(dir.join("bugtrack/config.yaml")) {
                return config;
            }
        }

        let mut config = Self::default();

        if let Ok(db_path) = std::env::var("BUGTRACK_DB_PATH") {
            config.db_path = PathBuf::from(db_path);
        }

        if let Ok(key) = std::env::var("BUGTRACK_PROJECT_KEY") {
            if !key.is_empty() {
                config.project_key = key;
            }
        }

        if let Ok(limit) = std::env::var("BUGTRACK_PAGE_LIMIT") {
            if let Ok(limit) = limit.parse() {
                config.page_limit = limit;
            }
        }

        config
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
