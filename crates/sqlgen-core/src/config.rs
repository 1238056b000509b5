//! Configuration schema (sqlgen.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE: &str = "sqlgen.toml";

/// External formatter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Run generated code through the formatter
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Formatter command, reading source on stdin
    #[serde(default = "default_command")]
    pub command: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_command(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_command() -> String {
    "gofmt".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Package name or import path of the generated library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Output directory, relative to the configuration file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,

    /// Extra imports, as `prefix:path` or a bare `path`
    #[serde(default)]
    pub imports: Vec<String>,

    /// Formatter settings
    #[serde(default)]
    pub format: FormatConfig,

    /// Directory holding the configuration file (for resolving relative paths)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Relative paths are relative to the config file
        if let Some(parent) = path.parent() {
            config.root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Configured output directory, resolved against the config file location
    pub fn out_dir(&self) -> Option<PathBuf> {
        self.out.as_ref().map(|out| self.root.join(out))
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
