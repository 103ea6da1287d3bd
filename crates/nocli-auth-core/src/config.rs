//! Application configuration management.
//!
//! Holds the API base URL override, the token storage key, the data directory
//! and the last used username. Configuration is stored at `~/.config/docker-nocli/config.json`;
//! the `NOCLI_API_BASE_URL` environment variable takes precedence over the
//! file for the base URL.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_TOKEN_KEY;

/// Application name used for config/data directory paths
const APP_NAME: &str = "docker-nocli";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
pub const API_BASE_URL_ENV: &str = "NOCLI_API_BASE_URL";

/// Where the management server listens by default
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8193";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    /// Base URL from the environment, then the file, then the default.
    pub fn api_base_url(&self) -> String {
        self.resolve_api_base_url(std::env::var(API_BASE_URL_ENV).ok())
    }

    fn resolve_api_base_url(&self, env_value: Option<String>) -> String {
        let chosen = env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_base_url.clone().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        chosen.trim().trim_end_matches('/').to_string()
    }

    /// Storage key, used as the token file name inside the data directory.
    /// Keys that would escape that directory are rejected.
    pub fn storage_key(&self) -> Result<&str> {
        let key = self
            .storage_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_TOKEN_KEY);
        if key == "." || key == ".." || key.contains(|c: char| c == '/' || c == '\\') {
            anyhow::bail!("Invalid storage key {:?}: must be a plain file name", key);
        }
        Ok(key)
    }

    /// Directory holding the token file and logs. A `data_dir` set in the
    /// config file wins over the platform default.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.data_dir {
            return dir.clone();
        }
        match dirs::data_dir() {
            Some(dir) => dir.join(APP_NAME),
            None => PathBuf::from(format!(".{}", APP_NAME)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.storage_key().unwrap(), "docker-nocli-auth-token");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_base_url: Some("http://nas.local:8193".to_string()),
            storage_key: None,
            last_username: Some("admin".to_string()),
            data_dir: None,
        };

        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("storage_key"));
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_base_url_precedence() {
        let config = Config {
            api_base_url: Some("http://from-file:1/".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_api_base_url(Some("http://from-env:2".to_string())),
            "http://from-env:2"
        );
        assert_eq!(config.resolve_api_base_url(Some("  ".to_string())), "http://from-file:1");
        assert_eq!(config.resolve_api_base_url(None), "http://from-file:1");
        assert_eq!(Config::default().resolve_api_base_url(None), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_custom_storage_key() {
        let config = Config {
            storage_key: Some("other-key".to_string()),
            ..Config::default()
        };
        assert_eq!(config.storage_key().unwrap(), "other-key");
    }

    #[test]
    fn test_storage_key_cannot_leave_data_dir() {
        for bad in ["../token", "a/b", "..", ".", "sub\\token", "/etc/passwd"] {
            let config = Config {
                storage_key: Some(bad.to_string()),
                ..Config::default()
            };
            assert!(config.storage_key().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_data_dir_from_config() {
        let config = Config {
            data_dir: Some(PathBuf::from("/srv/nocli")),
            ..Config::default()
        };
        assert_eq!(config.data_dir(), PathBuf::from("/srv/nocli"));
        assert!(Config::default()
            .data_dir()
            .to_string_lossy()
            .ends_with("docker-nocli"));
    }
}
