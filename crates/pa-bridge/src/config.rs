//! Bridge configuration, loadable from YAML or TOML.
//!
//! Every section and every field has an explicit default, so a config file
//! only needs the settings that differ (usually the sensor URLs).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use pa_mqtt_channel::{MqttConfig, MqttError};

/// Environment variable overriding the config file location.
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

/// Config file used when neither the environment nor the command line names one.
pub const DEFAULT_CONFIG_PATH: &str = "/app/config/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] MqttError),
}

/// Top-level configuration for the bridge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// MQTT connection settings.
    #[serde(default)]
    pub mqtt: MqttConfig,
    /// Devices to poll.
    #[serde(default)]
    pub purple_air: PurpleAirConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Home Assistant discovery settings.
    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,
}

/// PurpleAir device polling settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PurpleAirConfig {
    /// Local JSON endpoints, e.g. `http://10.0.0.12/json`. Duplicates are polled twice.
    #[serde(default)]
    pub urls: Vec<String>,
    /// Seconds between poll cycles.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for PurpleAirConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            refresh_interval_seconds: default_refresh_interval(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Home Assistant MQTT discovery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeAssistantConfig {
    #[serde(default = "default_discovery_enabled")]
    pub discovery_enabled: bool,
    /// Discovery prefix Home Assistant listens on.
    #[serde(default = "default_discovery_topic")]
    pub discovery_topic: String,
}

fn default_discovery_enabled() -> bool {
    true
}

fn default_discovery_topic() -> String {
    "homeassistant".to_string()
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            discovery_enabled: default_discovery_enabled(),
            discovery_topic: default_discovery_topic(),
        }
    }
}

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `pa_bridge=debug,info`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Log file; stdout when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Rotate the log file daily.
    #[serde(default)]
    pub rotate: bool,
    /// Rotated files to keep.
    #[serde(default = "default_max_keep")]
    pub max_keep: usize,
    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_max_keep() -> usize {
    10
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            path: None,
            rotate: false,
            max_keep: default_max_keep(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from a file. `.toml` files are read as TOML, anything
    /// else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            Self::from_toml_str(&contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::from_yaml_str(&contents).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty mapping.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mqtt.validate()?;
        Ok(())
    }
}

/// Pick the config file: `CONFIG_FILE`, then the first CLI argument, then
/// [`DEFAULT_CONFIG_PATH`].
pub fn resolve_path(env_override: Option<String>, cli_arg: Option<String>) -> PathBuf {
    env_override
        .filter(|p| !p.is_empty())
        .or(cli_arg)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
