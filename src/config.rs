use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Base URL of the remote document store's REST surface.
    #[serde(default = "default_remote_base_url")]
    pub remote_base_url: String,

    pub remote_api_key: Option<String>,

    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_minutes: u32,

    #[serde(default = "default_watch_poll_secs")]
    pub watch_poll_secs: u64,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("showcase-sync");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("mirror.db").to_string_lossy().to_string()
}

fn default_remote_base_url() -> String {
    "https://content.example.dev/v1".to_string()
}

fn default_cache_max_age() -> u32 {
    30
}

fn default_watch_poll_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            remote_base_url: default_remote_base_url(),
            remote_api_key: None,
            cache_max_age_minutes: default_cache_max_age(),
            watch_poll_secs: default_watch_poll_secs(),
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
            .join("showcase-sync")
            .join("config.toml")
    }
}
