//! Configuration management for the clink tool.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/clink/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clink_protocol::{DEFAULT_AUTH_MECHANISM, MAX_FRAME_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_frame_size must be greater than 0, got {0}")]
    InvalidMaxFrameSize(usize),

    #[error("device_code must be ASCII, got {0:?}")]
    InvalidDeviceCode(String),

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the clink tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Client identity and credential settings.
    pub client: ClientConfig,

    /// Frame encoding and decoding settings.
    pub framing: FramingConfig,
}

/// Client identity and credential settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Device code sent in connection requests.
    pub device_code: String,

    /// Authentication mechanism tag for encrypted credentials.
    pub auth_mechanism: u32,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// Frame encoding and decoding settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FramingConfig {
    /// Largest frame accepted when decoding a stream.
    pub max_frame_size: usize,

    /// Encode frames with the build sub-header by default.
    pub build_message: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            device_code: String::new(),
            auth_mechanism: DEFAULT_AUTH_MECHANISM,
            log_level: "info".to_string(),
        }
    }
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            build_message: false,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clink")
        .join("config.toml")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - CLINK_DEVICE_CODE: Override the device code
    /// - CLINK_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(code) = std::env::var("CLINK_DEVICE_CODE") {
            if !code.is_empty() {
                tracing::info!("Overriding device_code from environment");
                self.client.device_code = code;
            }
        }

        if let Ok(level) = std::env::var("CLINK_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log_level from environment: {}", level);
                self.client.log_level = level;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.framing.max_frame_size == 0 {
            return Err(ConfigError::InvalidMaxFrameSize(self.framing.max_frame_size));
        }

        if !self.client.device_code.is_ascii() {
            return Err(ConfigError::InvalidDeviceCode(
                self.client.device_code.clone(),
            ));
        }

        let level = self.client.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.client.log_level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.client.device_code, "");
        assert_eq!(config.client.auth_mechanism, 1);
        assert_eq!(config.client.log_level, "info");
        assert_eq!(config.framing.max_frame_size, 16 * 1024 * 1024);
        assert!(!config.framing.build_message);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[client]
device_code = "web_AbCdEf123"
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.client.device_code, "web_AbCdEf123");
        assert_eq!(config.client.auth_mechanism, 1);
        assert_eq!(config.framing, FramingConfig::default());
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
[client]
device_code = "dev1"
auth_mechanism = 2
log_level = "trace"

[framing]
max_frame_size = 65536
build_message = true
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.client.device_code, "dev1");
        assert_eq!(config.client.auth_mechanism, 2);
        assert_eq!(config.client.log_level, "trace");
        assert_eq!(config.framing.max_frame_size, 65536);
        assert!(config.framing.build_message);
    }

    #[test]
    fn test_from_toml_invalid_syntax() {
        let toml = r#"
[client
log_level = "debug"
"#;
        let err = Config::from_toml(toml).unwrap_err().to_string();
        assert!(err.contains("Invalid TOML"));
    }

    #[test]
    fn test_from_toml_wrong_type() {
        let toml = r#"
[client]
auth_mechanism = "one"
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut original = Config::default();
        original.client.device_code = "dev-42".to_string();
        original.framing.build_message = true;

        let toml = original.to_toml().unwrap();
        assert!(toml.contains("[client]"));
        assert!(toml.contains("[framing]"));
        assert_eq!(Config::from_toml(&toml).unwrap(), original);
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.client.log_level = "debug".to_string();
        original.framing.max_frame_size = 4096;

        original.save(&config_path).unwrap();
        assert_eq!(Config::load(&config_path).unwrap(), original);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "invalid [ toml").unwrap();

        let err = Config::load(&config_path).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("clink"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_validate_zero_frame_size() {
        let mut config = Config::default();
        config.framing.max_frame_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxFrameSize(0)));
    }

    #[test]
    fn test_validate_non_ascii_device_code() {
        let mut config = Config::default();
        config.client.device_code = "设备".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDeviceCode(_))
        ));
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = Config::default();
        config.client.log_level = "WARN".to_string();
        assert!(config.validate().is_ok());

        config.client.log_level = "verbose".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
    }

    #[test]
    #[serial]
    fn test_env_override_device_code() {
        std::env::set_var("CLINK_DEVICE_CODE", "env-device");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.client.device_code, "env-device");

        std::env::remove_var("CLINK_DEVICE_CODE");
    }

    #[test]
    #[serial]
    fn test_env_override_empty_does_not_override() {
        std::env::set_var("CLINK_LOG_LEVEL", "");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.client.log_level, "info");

        std::env::remove_var("CLINK_LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn test_env_override_log_level() {
        std::env::remove_var("CLINK_DEVICE_CODE");
        std::env::set_var("CLINK_LOG_LEVEL", "trace");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.client.log_level, "trace");
        assert_eq!(config.client.device_code, "");

        std::env::remove_var("CLINK_LOG_LEVEL");
    }
}
