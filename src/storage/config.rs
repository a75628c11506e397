//! Configuration management
//!
//! Connection defaults stored in `config.toml`. Priority when resolving a
//! value: CLI argument > SNOWFLAKE_* environment variable > config.toml.
//! The password is never part of the file.

use super::Result;
use crate::api::client::DEFAULT_TIMEOUT_SECS;
use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Account identifier, e.g. `xy12345.us-east-1` or `myorg-myaccount`
    pub account: Option<String>,
    /// Login name
    pub user: Option<String>,
    /// Role to activate at login
    pub role: Option<String>,
    /// Base URL override, e.g. a PrivateLink endpoint
    pub host: Option<String>,
    /// HTTP timeout per request
    pub timeout_seconds: Option<u64>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
                message: format!("Failed to parse config file: {}", e),
            })?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::FileIo {
                path: parent.to_string_lossy().to_string(),
                source,
            })?;
        }

        let toml_content = toml::to_string(self).map_err(|e| StorageError::ConfigParseError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&config_path, toml_content).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().ok_or(StorageError::ConfigDirNotFound)?;

        let app_config_dir = home_dir.join(".config").join("snowparam");
        let config_file = app_config_dir.join("config.toml");

        Ok(config_file)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_seconds
            .filter(|t| *t > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// First non-empty value among the argument (already merged with its
    /// environment variable by clap) and the stored value
    pub fn resolve(arg: Option<&str>, stored: Option<&str>) -> Option<String> {
        arg.filter(|v| !v.is_empty())
            .or(stored.filter(|v| !v.is_empty()))
            .map(str::to_string)
    }
}
