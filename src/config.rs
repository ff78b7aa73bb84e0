use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{RelayError, Result};

/// Log levels accepted by the configuration surface
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Log output formats accepted by the configuration surface
pub const LOG_FORMATS: &[&str] = &["plain", "json"];

/// Default bound on the summed uncompressed size of an archive (2 GiB).
/// A configured value of 0 disables the bound.
pub const DEFAULT_ZIPFILE_MAX_UNCOMPRESSED_SIZE: i64 = 2 * 1024 * 1024 * 1024;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "plain".to_string()
}

fn default_zipfile_max_uncompressed_size() -> i64 {
    DEFAULT_ZIPFILE_MAX_UNCOMPRESSED_SIZE
}

fn default_registry_url() -> String {
    "http://localhost:8080".to_string()
}

/// Per-organization registry access settings
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct OrganizationConfig {
    /// Auth token presented to the registry for this organization
    #[serde(default)]
    pub token: Option<String>,
}

/// Registry collaborator settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub base_url: String,

    /// Request timeout in seconds; absent means the client default
    #[serde(default)]
    pub request_timeout: Option<u64>,

    /// Organizations this service may publish to; pushes targeting any
    /// other organization are rejected before contacting the registry
    #[serde(default)]
    pub organizations: HashMap<String, OrganizationConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            base_url: default_registry_url(),
            request_timeout: None,
            organizations: HashMap::new(),
        }
    }
}

/// Build-system collaborator settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BuildSystemConfig {
    #[serde(default = "default_registry_url")]
    pub hub_url: String,

    /// Base URL the archive paths from build metadata resolve against
    #[serde(default = "default_registry_url")]
    pub root_url: String,

    #[serde(default)]
    pub request_timeout: Option<u64>,
}

impl Default for BuildSystemConfig {
    fn default() -> Self {
        BuildSystemConfig {
            hub_url: default_registry_url(),
            root_url: default_registry_url(),
            request_timeout: None,
        }
    }
}

/// Complete configuration for manifest-relay.
///
/// Loaded once at startup and validated before any request is served;
/// invalid values abort startup rather than failing requests later.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Bound on the summed uncompressed size of pushed archives, in bytes.
    /// Kept signed so a negative value is caught by validation instead of
    /// wrapping; 0 disables the bound.
    #[serde(default = "default_zipfile_max_uncompressed_size")]
    pub zipfile_max_uncompressed_size: i64,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub build_system: BuildSystemConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            log_format: default_log_format(),
            zipfile_max_uncompressed_size: default_zipfile_max_uncompressed_size(),
            registry: RegistryConfig::default(),
            build_system: BuildSystemConfig::default(),
        }
    }
}

impl Config {
    /// Reject configurations that must never reach request handling
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(RelayError::config(format!(
                "unknown log_level '{}', expected one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(RelayError::config(format!(
                "unknown log_format '{}', expected one of: {}",
                self.log_format,
                LOG_FORMATS.join(", ")
            )));
        }

        if self.zipfile_max_uncompressed_size < 0 {
            return Err(RelayError::config(format!(
                "zipfile_max_uncompressed_size must be non-negative, got {}",
                self.zipfile_max_uncompressed_size
            )));
        }

        Ok(())
    }

    /// The archive size bound as the validator consumes it
    pub fn max_uncompressed_size(&self) -> u64 {
        self.zipfile_max_uncompressed_size as u64
    }
}

/// Loads configuration from file or returns validated defaults.
///
/// Lookup order:
/// 1. Custom path provided as parameter
/// 2. `manifest-relay.toml` in the current directory
/// 3. `manifest-relay.toml` in the user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        Some(fs::read_to_string(path)?)
    } else if Path::new("./manifest-relay.toml").exists() {
        Some(fs::read_to_string("./manifest-relay.toml")?)
    } else if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("manifest-relay.toml");
        if path.exists() {
            Some(fs::read_to_string(path)?)
        } else {
            None
        }
    } else {
        None
    };

    let config: Config = match config_str {
        Some(s) => toml::from_str(&s)
            .map_err(|e| RelayError::config(format!("cannot parse configuration: {}", e)))?,
        None => Config::default(),
    };

    config.validate()?;
    Ok(config)
}
