//! Application configuration management.
//!
//! Configuration is stored at `~/.config/nova-admin/config.json`; the API
//! base URL can also come from the `NOVA_API_URL` environment variable
//! (which wins over the config file, and may be supplied via `.env`).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "nova-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable supplying the API base URL
pub const API_URL_ENV: &str = "NOVA_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session record and log file
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Resolve the API base URL: environment first, then the config file.
    /// The app cannot run without one.
    pub fn resolve_base_url(&self) -> Result<String> {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .map(|url| normalize_base_url(&url))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "API base URL not configured. Set {} or api_base_url in config.json",
                    API_URL_ENV
                )
            })
    }
}

/// Strip trailing slashes so request paths can always start with '/'
fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://api.test/"), "http://api.test");
        assert_eq!(normalize_base_url("http://api.test"), "http://api.test");
        assert_eq!(
            normalize_base_url("  https://nova.example.org//  "),
            "https://nova.example.org"
        );
    }

    #[test]
    fn test_config_file_supplies_base_url() {
        let config = Config {
            api_base_url: Some("http://api.test/".to_string()),
            last_username: None,
        };
        // Environment may or may not be set when tests run; only assert the
        // config-file fallback when it is not.
        if std::env::var(API_URL_ENV).is_err() {
            assert_eq!(config.resolve_base_url().unwrap(), "http://api.test");
        }
    }
}
