//! Application configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! app_name = "ping"
//! env = "prod"
//! thrift_file = "ping.thrift"
//! syslog_disabled = false
//!
//! # anything else is kept and readable through `AppConfig::get`
//! port = 8010
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use takumi_core::CallArgs;
use thiserror::Error;

/// Environment variable naming the config file read by [`AppConfig::load`].
pub const CONFIG_ENV_VAR: &str = "TAKUMI_CONFIG";

/// Config file read by [`AppConfig::load`] when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "app.toml";

/// Errors from loading an [`AppConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for an [`AppConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_env() -> String {
    "dev".to_string()
}

/// Application-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name.
    pub app_name: String,
    /// Deployment environment.
    #[serde(default = "default_env")]
    pub env: String,
    /// Path of the service definition file.
    pub thrift_file: PathBuf,
    /// Log to the console even outside `dev`.
    #[serde(default)]
    pub syslog_disabled: bool,
    /// Every other key.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl AppConfig {
    /// Settings for `app_name` in `dev`.
    pub fn new(app_name: impl Into<String>, thrift_file: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            env: default_env(),
            thrift_file: thrift_file.into(),
            syslog_disabled: false,
            extra: toml::Table::new(),
        }
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Read the file named by `TAKUMI_CONFIG`, or `app.toml`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_file(path)
    }

    /// Look up a key outside the known fields.
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.extra.get(key)
    }

    /// Every setting as keyword arguments, for the `init_process` hooks.
    pub fn log_args(&self) -> CallArgs {
        let mut args = CallArgs::new()
            .kwarg("app_name", self.app_name.as_str())
            .kwarg("env", self.env.as_str())
            .kwarg("thrift_file", self.thrift_file.to_string_lossy().into_owned())
            .kwarg("syslog_disabled", self.syslog_disabled);
        for (key, value) in &self.extra {
            if let Ok(value) = serde_json::to_value(value) {
                args = args.kwarg(key.as_str(), value);
            }
        }
        args
    }
}
