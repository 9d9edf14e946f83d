//! Shared configuration for the Alcove plugin layer binaries.
//!
//! Configuration lives in a single TOML file at
//! `{config_dir}/alcove/config.toml`. Every field is optional in the file;
//! missing fields (or a missing file) fall back to the defaults in
//! [`defaults`]. Command-line flags layered by the binaries take precedence
//! over file values.

mod defaults;
mod logging;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

pub use self::defaults::{
    DEFAULT_INVOKE_TIMEOUT_SECS, DEFAULT_LOG_FILTER, config_root, default_plugins_dir,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// File name of the configuration file inside the config root.
pub const CONFIG_FILE: &str = "config.toml";

/// Errors encountered while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The configuration file is not valid TOML or has wrong field types.
    #[error("failed to parse config file '{path}': {message}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

/// Resolved configuration for the plugin layer.
///
/// # Example
///
/// ```
/// use alcove_config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.log_filter(), "info");
/// assert!(config.always_prompt_output());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    plugins_dir: PathBuf,
    log_filter: String,
    log_format: LogFormat,
    always_prompt_output: bool,
    invoke_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugins_dir: default_plugins_dir(),
            log_filter: String::from(DEFAULT_LOG_FILTER),
            log_format: LogFormat::default(),
            always_prompt_output: true,
            invoke_timeout_secs: DEFAULT_INVOKE_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from the default location.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_root().join(CONFIG_FILE))
    }

    /// Loads configuration from an explicit file path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            source: Arc::new(err),
        })?;
        let file: ConfigFile = toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(file.merge_over(Self::default()))
    }

    /// Returns the plugins install root.
    #[must_use]
    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    /// Overrides the plugins install root.
    #[must_use]
    pub fn with_plugins_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugins_dir = dir.into();
        self
    }

    /// Returns the tracing filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Overrides the tracing filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Returns the logging output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Overrides the logging output format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Returns whether the save prompt is offered after a failed result.
    #[must_use]
    pub const fn always_prompt_output(&self) -> bool {
        self.always_prompt_output
    }

    /// Overrides the save-prompt policy.
    #[must_use]
    pub const fn with_always_prompt_output(mut self, always: bool) -> Self {
        self.always_prompt_output = always;
        self
    }

    /// Returns the module invocation timeout in seconds.
    #[must_use]
    pub const fn invoke_timeout_secs(&self) -> u64 {
        self.invoke_timeout_secs
    }

    /// Overrides the module invocation timeout.
    #[must_use]
    pub const fn with_invoke_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.invoke_timeout_secs = timeout_secs;
        self
    }
}

/// On-disk shape of the configuration file; every field optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    plugins_dir: Option<PathBuf>,
    #[serde(default)]
    log_filter: Option<String>,
    #[serde(default)]
    log_format: Option<LogFormat>,
    #[serde(default)]
    always_prompt_output: Option<bool>,
    #[serde(default)]
    invoke_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Layers file values over the given base configuration.
    fn merge_over(self, base: Config) -> Config {
        Config {
            plugins_dir: self.plugins_dir.unwrap_or(base.plugins_dir),
            log_filter: self.log_filter.unwrap_or(base.log_filter),
            log_format: self.log_format.unwrap_or(base.log_format),
            always_prompt_output: self.always_prompt_output.unwrap_or(base.always_prompt_output),
            invoke_timeout_secs: self.invoke_timeout_secs.unwrap_or(base.invoke_timeout_secs),
        }
    }
}
