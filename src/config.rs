//! Configuration file support for the dashboard
//!
//! Reads from dashboard.toml, found by walking up from the current directory

use crate::dataset::RowPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "dashboard.toml";
/// Explicit config file location
pub const CONFIG_ENV: &str = "ENGAGEMENT_DASHBOARD_CONFIG";
/// Overrides `data.path`
pub const DATA_PATH_ENV: &str = "ENGAGEMENT_DATA_PATH";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Input dataset settings
    #[serde(default)]
    pub data: DataConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Input dataset configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DataConfig {
    /// CSV file to load at startup
    /// Default: "social_media_engagement.csv"
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Rows with an unparseable Date or Engagement_Count: "abort" or "skip"
    /// Default: "abort"
    #[serde(default)]
    pub on_bad_row: RowPolicy,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Default: "127.0.0.1"
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 8050
    #[serde(default = "default_port")]
    pub port: u16,

    /// Verbose logging and pretty-printed API responses
    #[serde(default)]
    pub debug: bool,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("social_media_engagement.csv")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8050
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            on_bad_row: RowPolicy::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
        }
    }
}

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Load config from an explicit path, `$ENGAGEMENT_DASHBOARD_CONFIG`, or
    /// the nearest dashboard.toml. Returns defaults when none exists.
    ///
    /// A relative `data.path` is resolved against the config file's directory.
    /// `$ENGAGEMENT_DATA_PATH` wins over the file.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(Self::find_config_path);

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(data_path) = std::env::var_os(DATA_PATH_ENV) {
            config.data.path = PathBuf::from(data_path);
        }
        Ok(config)
    }

    /// Parse a specific config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        if config.data.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.data.path = dir.join(&config.data.path);
            }
        }
        Ok(config)
    }

    /// Find dashboard.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// `host:port` to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
