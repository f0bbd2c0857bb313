//! Configuration settings for phpup.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{PhpupError, PhpupResult};

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The user on whose behalf phpup manages files and FPM pools.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    /// Managing user name.
    #[serde(default = "default_user")]
    pub name: String,
    /// Managing group name.
    #[serde(default = "default_user")]
    pub group: String,
}

/// Paths configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// phpup home directory (marker file, logs, sockets).
    #[serde(default = "default_home")]
    pub home: PathBuf,
    /// The system's default `php` binary symlink.
    #[serde(default = "default_php_binary")]
    pub php_binary: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions

fn default_user() -> String {
    // Under sudo the invoking user, not root, owns the environment.
    std::env::var("SUDO_USER")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "root".to_string())
}

fn default_home() -> PathBuf {
    let base = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
    Path::new(&base).join(".phpup")
}

fn default_php_binary() -> PathBuf {
    PathBuf::from("/usr/bin/php")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: default_user(),
            group: default_user(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            php_binary: default_php_binary(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user: UserConfig::default(),
            paths: PathsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file; a missing file yields pure defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> PhpupResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let settings = Self::default();
            settings.validate()?;
            return Ok(settings);
        }

        let content = std::fs::read_to_string(path).map_err(|e| PhpupError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| PhpupError::Config {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Path of the version marker file.
    pub fn version_marker_path(&self) -> PathBuf {
        self.paths.home.join("php_version")
    }

    /// Directory for FPM pool logs.
    pub fn log_dir(&self) -> PathBuf {
        self.paths.home.join("log")
    }

    /// Validate the settings.
    fn validate(&self) -> PhpupResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(PhpupError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(PhpupError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.user.name.is_empty() {
            return Err(PhpupError::Config {
                message: "User name must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
