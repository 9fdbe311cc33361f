//! Server configuration: defaults, an optional YAML file, then environment
//! overrides.

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_VAR: &str = "BILL_TRACKER_CONFIG";
pub const DATA_DIR_VAR: &str = "BILL_TRACKER_DATA_DIR";
pub const BIND_VAR: &str = "BILL_TRACKER_BIND";
pub const CORS_ORIGIN_VAR: &str = "BILL_TRACKER_CORS_ORIGIN";
pub const LOG_FILTER_VAR: &str = "RUST_LOG";

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_directory: PathBuf,
    pub bind_address: String,
    pub cors_origin: String,
    /// Category given to generated credit-card payoff bills
    pub payoff_category_id: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
            payoff_category_id: "credit-card-payoff".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

/// `<platform data dir>/Bill Tracker`, or `./data` when the platform has none
pub fn default_data_directory() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("Bill Tracker"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl AppConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` for environment variables
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_directory = lookup(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_directory);
        let config_path = lookup(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_directory.join(CONFIG_FILE));

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        if let Some(dir) = lookup(DATA_DIR_VAR) {
            config.data_directory = PathBuf::from(dir);
        }
        if let Some(bind) = lookup(BIND_VAR) {
            config.bind_address = bind;
        }
        if let Some(origin) = lookup(CORS_ORIGIN_VAR) {
            config.cors_origin = origin;
        }
        if let Some(filter) = lookup(LOG_FILTER_VAR) {
            config.log_filter = filter;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
