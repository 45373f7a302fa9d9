//! Configuration file (`config.toml`) and environment overrides

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::translation::DEFAULT_BASE_URL;

pub const APP_DIR: &str = "flashdeck";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "flashdeck.db";

pub const AI_SERVICE_URL_VAR: &str = "FLASHDECK_AI_SERVICE_URL";
pub const STORE_URL_VAR: &str = "FLASHDECK_STORE_URL";
pub const STORE_API_KEY_VAR: &str = "FLASHDECK_STORE_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Could not determine {0} directory")]
    NoDirectory(&'static str),

    #[error("Missing setting: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Rest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// SQLite database file (defaults to the local data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Base URL of the hosted store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Public API key of the hosted store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub inference: InferenceConfig,
}

impl Config {
    /// `<config dir>/flashdeck/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoDirectory("config"))
    }

    /// Load from `path`, or the default location when `None`. A missing file
    /// gives the defaults; environment overrides are applied either way.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = if path.exists() {
            log::debug!("Loading config from {}", path.display());
            Self::from_toml_str(&std::fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|var| std::env::var(var).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(AI_SERVICE_URL_VAR) {
            self.inference.base_url = url;
        }
        if let Some(url) = lookup(STORE_URL_VAR) {
            self.store.url = Some(url);
        }
        if let Some(key) = lookup(STORE_API_KEY_VAR) {
            self.store.api_key = Some(key);
        }
    }

    /// SQLite file to open: the configured path or the default data location
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => dirs::data_local_dir()
                .map(|d| d.join(APP_DIR).join(DATABASE_FILE))
                .ok_or(ConfigError::NoDirectory("data")),
        }
    }

    /// URL and API key of the hosted store
    pub fn rest_endpoint(&self) -> Result<(&str, &str), ConfigError> {
        let url = self.store.url.as_deref().ok_or(ConfigError::Missing("store.url"))?;
        let key = self
            .store
            .api_key
            .as_deref()
            .ok_or(ConfigError::Missing("store.api_key"))?;
        Ok((url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.inference.base_url, "http://localhost:8000");
        assert_eq!(config.inference.timeout_secs, 60);
    }

    #[test]
    fn test_parse_rest_backend() {
        let config = Config::from_toml_str(
            r#"
            [store]
            backend = "rest"
            url = "https://db.example.com"
            api_key = "anon"

            [inference]
            base_url = "https://ai.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Rest);
        assert_eq!(
            config.rest_endpoint().unwrap(),
            ("https://db.example.com", "anon")
        );
        assert_eq!(config.inference.base_url, "https://ai.example.com");
        assert_eq!(config.inference.timeout_secs, 60);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[store]\nbackend = \"mongo\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|var| match var {
            AI_SERVICE_URL_VAR => Some("http://ai:9000".to_string()),
            STORE_API_KEY_VAR => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.inference.base_url, "http://ai:9000");
        assert_eq!(config.store.api_key, None);
        assert!(matches!(config.rest_endpoint(), Err(ConfigError::Missing("store.url"))));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(Some(&temp.path().join("absent.toml"))).unwrap();
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_explicit_database_path() {
        let config = Config::from_toml_str("[store]\npath = \"/tmp/cards.db\"").unwrap();
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/cards.db"));
    }
}
