#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for apkm
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/apkm/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)
//!
//! It also provides [`PathManager`], the single source of the working, cache
//! and log directories used by an installation attempt.

pub mod paths;

pub use paths::PathManager;

use apkm_errors::{ConfigError, Error};
use apkm_types::ColorChoice;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub patching: PatchingConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
    /// Developer mode: exposes install ids and verbose step logs
    #[serde(default)]
    pub dev_mode: bool,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub data_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
}

/// Patching pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchingConfig {
    /// GitHub releases listing that carries `base.apk` and `injector.dex`
    #[serde(default = "default_releases_url")]
    pub releases_url: String,
    /// Delay before the first step runs so the UI can show it as Running
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
    /// Keystore used to re-sign the patched package (defaults to the data dir)
    #[serde(default)]
    pub keystore: Option<PathBuf>,
    #[serde(default = "default_keystore_password")]
    pub keystore_password: String,
    #[serde(default = "default_apksigner")]
    pub apksigner: String,
    #[serde(default = "default_adb")]
    pub adb: String,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
            dev_mode: false,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 300, // 5 minutes
            connect_timeout: 30,
            retries: 3,
            retry_delay: 1, // 1 second
        }
    }
}

impl Default for PatchingConfig {
    fn default() -> Self {
        Self {
            releases_url: default_releases_url(),
            start_delay_ms: default_start_delay_ms(),
            keystore: None,
            keystore_password: default_keystore_password(),
            apksigner: default_apksigner(),
            adb: default_adb(),
        }
    }
}

// Default value functions for serde
fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1 // 1 second
}

fn default_releases_url() -> String {
    "https://api.github.com/repos/wintry-mod/builds/releases".to_string()
}

fn default_start_delay_ms() -> u64 {
    400
}

fn default_keystore_password() -> String {
    "password".to_string()
}

fn default_apksigner() -> String {
    "apksigner".to_string()
}

fn default_adb() -> String {
    "adb".to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("apkm").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;
        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // APKM_COLOR
        if let Ok(color) = std::env::var("APKM_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "APKM_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // APKM_DEV_MODE
        if let Ok(dev) = std::env::var("APKM_DEV_MODE") {
            self.general.dev_mode = parse_bool("APKM_DEV_MODE", dev)?;
        }

        // APKM_DATA_DIR / APKM_CACHE_DIR
        if let Ok(dir) = std::env::var("APKM_DATA_DIR") {
            self.paths.data_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = std::env::var("APKM_CACHE_DIR") {
            self.paths.cache_dir = Some(PathBuf::from(dir));
        }

        // APKM_RELEASES_URL
        if let Ok(url) = std::env::var("APKM_RELEASES_URL") {
            self.patching.releases_url = url;
        }

        // APKM_START_DELAY_MS
        if let Ok(delay) = std::env::var("APKM_START_DELAY_MS") {
            self.patching.start_delay_ms =
                delay.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "APKM_START_DELAY_MS".to_string(),
                    value: delay,
                })?;
        }

        Ok(())
    }

    /// Data directory (install logs, keystore)
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("apkm")
        })
    }

    /// Cache directory (downloads, patching working directory)
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.paths.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("apkm")
        })
    }

    /// Path manager rooted at the configured directories
    #[must_use]
    pub fn path_manager(&self) -> PathManager {
        PathManager::new(self.data_dir(), self.cache_dir())
    }

    /// Keystore used for signing
    #[must_use]
    pub fn keystore_path(&self) -> PathBuf {
        self.patching
            .keystore
            .clone()
            .unwrap_or_else(|| self.data_dir().join("ks.keystore"))
    }
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}
