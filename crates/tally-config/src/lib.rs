//! Configuration management for tally
//!
//! This module handles loading, validation, and management of
//! tally configuration from YAML files.

pub mod error;

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use error::{ConfigError, ConfigResult};

/// Place name the portal uses for balance imports
pub const DEFAULT_IMPORT_PLACE: &str = "PatronImport Location";

/// Place prefix of the terminals that drain the residual balance at term end
pub const DEFAULT_DRAIN_PLACE_PREFIX: &str = "Workstation";

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Table parser settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParserConfig {
    /// Extra chrono formats tried after the built-in ones
    #[serde(default)]
    pub date_formats: Vec<String>,
}

/// Report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Offset defining the local calendar, e.g. "-05:00"
    #[serde(default)]
    pub utc_offset: Option<String>,
    /// Place that marks balance imports
    #[serde(default = "default_import_place")]
    pub import_place: String,
    /// Place prefix excluded from place statistics
    #[serde(default = "default_drain_place_prefix")]
    pub drain_place_prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            utc_offset: None,
            import_place: default_import_place(),
            drain_place_prefix: default_drain_place_prefix(),
        }
    }
}

fn default_import_place() -> String {
    DEFAULT_IMPORT_PLACE.to_string()
}

fn default_drain_place_prefix() -> String {
    DEFAULT_DRAIN_PLACE_PREFIX.to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Table parser settings
    #[serde(default)]
    pub parser: ParserConfig,
    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound { path }) => {
                log::debug!("No configuration at {}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if let Some(ref offset) = self.report.utc_offset {
            if parse_utc_offset(offset).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "report.utc_offset".to_string(),
                    reason: format!("Expected an offset like \"-05:00\", got \"{}\"", offset),
                });
            }
        }

        if self.report.import_place.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "report.import_place".to_string(),
                reason: "Import place must not be empty".to_string(),
            });
        }

        if self.report.drain_place_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "report.drain_place_prefix".to_string(),
                reason: "Drain place prefix must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Offset that defines the local calendar day.
    ///
    /// Falls back to the current offset of the host when none is configured.
    pub fn utc_offset(&self) -> FixedOffset {
        self.report
            .utc_offset
            .as_deref()
            .and_then(parse_utc_offset)
            .unwrap_or_else(|| Local::now().offset().fix())
    }
}

/// Parse an offset of the form `+HH:MM`, `-HH:MM`, `+HHMM` or `Z`
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match value.chars().next()? {
        '+' => (1, &value[1..]),
        '-' => (-1, &value[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

// ==================== Tests ====================
