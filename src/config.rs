use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::vcs::Strategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Root directory for persistent working copies.
    #[serde(default = "default_workdir")]
    pub workdir: String,

    #[serde(default)]
    pub working_copy: Strategy,

    pub healthcheck_url: Option<String>,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u32,

    #[serde(default = "default_git_timeout")]
    pub git_timeout_secs: u64,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("metasync");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("metadata.db").to_string_lossy().to_string()
}

fn default_workdir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("metasync")
        .join("workdir")
        .to_string_lossy()
        .to_string()
}

fn default_refresh_interval() -> u32 {
    60
}

fn default_git_timeout() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            workdir: default_workdir(),
            working_copy: Strategy::default(),
            healthcheck_url: None,
            refresh_interval_minutes: default_refresh_interval(),
            git_timeout_secs: default_git_timeout(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("metasync")
            .join("config.toml")
    }
}
