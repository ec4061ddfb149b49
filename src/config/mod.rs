//! Configuration for the enhancer CLI
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/enhancer/config.toml, or `ENHANCER_CONFIG`)
//! 3. Built-in defaults (lowest priority)

use crate::error::ConfigError;
use crate::stack::EnhancerSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod logging;
mod serialization;


pub use logging::{FileLogging, LogRotation, LoggingConfig};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Overrides the config file location
pub const CONFIG_ENV: &str = "ENHANCER_CONFIG";

/// Overrides `[logging] level`
pub const LOG_LEVEL_ENV: &str = "ENHANCER_LOG_LEVEL";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub logging: LoggingConfig,

    /// Enhancer stack, outermost first
    pub stack: Vec<EnhancerSpec>,
}

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    /// Optional [logging] section
    pub logging: Option<FileLogging>,

    /// Optional [[stack]] entries
    #[serde(default)]
    pub stack: Vec<EnhancerSpec>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: `$ENHANCER_CONFIG` or ~/.config/enhancer/config.toml
    ///
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|p| p.join(".config").join("enhancer").join("config.toml"))
    }

    /// Load configuration: env > file > defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        Ok(config.with_level_override(std::env::var(LOG_LEVEL_ENV).ok()))
    }

    /// Load file config from `path`; a missing file means defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let file: FileConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_file_config(file))
    }

    pub(crate) fn from_file_config(file: FileConfig) -> Self {
        Self {
            logging: LoggingConfig::from_file(file.logging),
            stack: file.stack,
        }
    }

    /// Apply a log level from the environment, if set and non-empty
    pub fn with_level_override(mut self, level: Option<String>) -> Self {
        if let Some(level) = level.filter(|l| !l.trim().is_empty()) {
            self.logging.level = level;
        }
        self
    }
}
