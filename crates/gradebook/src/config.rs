//! Configuration management for gradebook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "gradebook";

/// Default data file name.
const DATA_FILE_NAME: &str = "students.csv";

/// Default report file name, relative to the working directory.
const REPORT_FILE_NAME: &str = "report.txt";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "GRADEBOOK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `GRADEBOOK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/gradebook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Record limits.
    pub limits: Limits,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the persisted student file.
    /// Defaults to `~/.local/share/gradebook/students.csv`
    pub data_file: Option<PathBuf>,
    /// Path the report is exported to.
    /// Defaults to `report.txt` in the working directory.
    pub report_file: Option<PathBuf>,
}

/// Bounds enforced on every record in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of records the store holds.
    pub max_records: usize,
    /// Maximum length of a student name, in characters.
    pub max_name_length: usize,
    /// Maximum number of scored subjects per student.
    pub max_subjects: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_records: 1000,
            max_name_length: 99,
            max_subjects: 10,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (`config_path`, or the default path)
    /// 3. Environment variables (prefixed with `GRADEBOOK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_records == 0 {
            return Err(Error::ConfigValidation {
                message: "max_records must be greater than 0".to_string(),
            });
        }

        if self.limits.max_name_length == 0 {
            return Err(Error::ConfigValidation {
                message: "max_name_length must be greater than 0".to_string(),
            });
        }

        if self.limits.max_subjects == 0 {
            return Err(Error::ConfigValidation {
                message: "max_subjects must be greater than 0".to_string(),
            });
        }

        if self.data_file() == self.report_file() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "data_file and report_file must differ (both are {})",
                    self.data_file().display()
                ),
            });
        }

        Ok(())
    }

    /// Get the data file path, resolving defaults if not set.
    #[must_use]
    pub fn data_file(&self) -> PathBuf {
        self.storage
            .data_file
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATA_FILE_NAME))
    }

    /// Get the report file path, resolving defaults if not set.
    #[must_use]
    pub fn report_file(&self) -> PathBuf {
        self.storage
            .report_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(REPORT_FILE_NAME))
    }
}
