use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::ConfigError;

/// Defaults read from `~/.sftpsweep/config.toml`.
///
/// Every key is optional. Command-line flags take precedence over anything
/// set here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Login name
    #[serde(default = "default_user")]
    pub user: String,

    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Remote directory to start from
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Minimum age in days before a file is deleted
    #[serde(default)]
    pub age_days: f64,

    /// Regex of entry names to leave alone
    #[serde(default)]
    pub exclude: Option<String>,

    /// Regex of file names eligible for deletion
    #[serde(default)]
    pub include: Option<String>,

    /// Private key used instead of a password
    #[serde(default)]
    pub identity_file: Option<PathBuf>,

    /// Per-call timeout in seconds, 0 disables
    #[serde(default)]
    pub timeout_secs: u64,

    /// OpenSSH known_hosts file; defaults to ~/.ssh/known_hosts
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,

    /// Refuse hosts missing from known_hosts
    #[serde(default)]
    pub strict_host_keys: bool,

    /// Output format preference
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Quiet,
}

fn default_user() -> String {
    "anonymous".to_string()
}
fn default_port() -> u16 {
    22
}
fn default_directory() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: default_user(),
            port: default_port(),
            directory: default_directory(),
            age_days: 0.0,
            exclude: None,
            include: None,
            identity_file: None,
            timeout_secs: 0,
            known_hosts: None,
            strict_host_keys: false,
            output_format: OutputFormat::Human,
        }
    }
}

impl Config {
    /// Get the sftpsweep data directory (~/.sftpsweep)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".sftpsweep")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Load the default config file, or built-in defaults if it does not exist
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load an explicitly named config file. A missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            message: format!("Failed to parse config: {}", e),
        })
    }
}
