//! Configuration management for gradex.
//!
//! Loads configuration from ${GRADEX_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Grading-service connection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the grading service. `GRADEX_SERVER_URL` overrides it.
    pub base_url: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grading-service connection.
    #[serde(default)]
    pub server: ServerConfig,

    /// Timeout for follow-up questions in seconds (0 disables)
    pub follow_up_timeout_secs: u32,

    /// Timeout for job submission in seconds (0 disables)
    pub request_timeout_secs: u32,
}

impl Config {
    const DEFAULT_FOLLOW_UP_TIMEOUT_SECS: u32 = 30;
    /// Uploads can be large; generous by default.
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 120;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    pub fn follow_up_timeout(&self) -> Option<Duration> {
        if self.follow_up_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.follow_up_timeout_secs)))
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            follow_up_timeout_secs: Self::DEFAULT_FOLLOW_UP_TIMEOUT_SECS,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// The default configuration file content with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, edit default_config.toml directly.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for gradex configuration and data directories.
    //!
    //! GRADEX_HOME resolution order:
    //! 1. GRADEX_HOME environment variable (if set)
    //! 2. ~/.config/gradex (default)

    use std::path::PathBuf;

    /// Returns the gradex home directory.
    ///
    /// Checks GRADEX_HOME env var first, falls back to ~/.config/gradex
    pub fn gradex_home() -> PathBuf {
        if let Ok(home) = std::env::var("GRADEX_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("gradex"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        gradex_home().join("config.toml")
    }

    /// Returns the path to the log directory.
    pub fn logs_dir() -> PathBuf {
        gradex_home().join("logs")
    }
}
