//! Configuration management for soulscripts.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "soulscripts";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "journal.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SOULSCRIPTS_`)
/// 2. TOML config file at `~/.config/soulscripts/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Sharing configuration.
    pub sharing: SharingConfig,
    /// Network configuration.
    pub network: NetworkConfig,
    /// Ambient sound configuration.
    pub audio: AudioConfig,
    /// Writing goal configuration.
    pub writing: WritingConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/soulscripts/journal.db`
    pub database_path: Option<PathBuf>,
    /// Directory backups are written to.
    /// Defaults to the current directory.
    pub backup_dir: Option<PathBuf>,
}

/// Sharing-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingConfig {
    /// Origin used to build public view links.
    pub base_url: String,
    /// Refuse sharing changes while offline.
    pub require_online: bool,
}

/// Network-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// `host:port` the connectivity probe connects to.
    pub probe_address: String,
    /// Probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
}

/// Ambient sound configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Volume used before the user picks one, in `[0, 1]`.
    pub default_volume: f32,
    /// Directory sound files are resolved against.
    pub sounds_dir: Option<PathBuf>,
}

/// Writing goal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WritingConfig {
    /// Daily word goal.
    pub daily_word_goal: usize,
    /// How many days back the streak counter looks.
    pub streak_window_days: u32,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            require_online: true,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_address: "1.1.1.1:443".to_string(),
            probe_timeout_ms: 3_000,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            default_volume: 0.5,
            sounds_dir: None,
        }
    }
}

impl Default for WritingConfig {
    fn default() -> Self {
        Self {
            daily_word_goal: 250,
            streak_window_days: 30,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `SOULSCRIPTS_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("SOULSCRIPTS_").split("__"));

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
        let base_url = self.sharing.base_url.as_str();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::ConfigValidation {
                message: format!("sharing.base_url must be an http(s) URL, got '{base_url}'"),
            });
        }

        if !self.network.probe_address.contains(':') {
            return Err(Error::ConfigValidation {
                message: format!(
                    "network.probe_address must be host:port, got '{}'",
                    self.network.probe_address
                ),
            });
        }

        if self.network.probe_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "probe_timeout_ms must be greater than 0".to_string(),
            });
        }

        let volume = self.audio.default_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(Error::ConfigValidation {
                message: format!("default_volume must be between 0 and 1, got {volume}"),
            });
        }

        if self.writing.daily_word_goal == 0 {
            return Err(Error::ConfigValidation {
                message: "daily_word_goal must be greater than 0".to_string(),
            });
        }

        if self.writing.streak_window_days == 0 {
            return Err(Error::ConfigValidation {
                message: "streak_window_days must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the backup directory, resolving defaults if not set.
    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.storage
            .backup_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the sounds directory, resolving defaults if not set.
    #[must_use]
    pub fn sounds_dir(&self) -> PathBuf {
        self.audio
            .sounds_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("sounds"))
    }

    /// Get the probe timeout as a Duration.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.network.probe_timeout_ms)
    }
}
