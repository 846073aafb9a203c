//! Configuration management for media-export
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use toml_edit::DocumentMut;

use crate::error::{ConfigError, Result};
use crate::export::{FilenamePolicy, PairingPolicy};
use crate::formatter::TableStyle;
use crate::utils::fs::ensure_dir_exists;

/// Environment variable overriding the connection URI
pub const ENV_URI: &str = "MEDIA_EXPORT_URI";
/// Environment variable overriding the database name
pub const ENV_DATABASE: &str = "MEDIA_EXPORT_DATABASE";
/// Environment variable overriding the export directory
pub const ENV_EXPORT_DIR: &str = "MEDIA_EXPORT_DIR";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "MEDIA_EXPORT_LOG_LEVEL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Export target configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// MongoDB connection URI
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database holding the asset repository
    #[serde(default = "default_database")]
    pub database: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Number of asset documents fetched per cursor batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Collection holding asset documents
    #[serde(default = "default_assets_collection")]
    pub assets_collection: String,

    /// GridFS bucket holding resource content
    #[serde(default = "default_resource_bucket")]
    pub resource_bucket: String,
}

/// Export target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Base directory the assets are written to
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,

    /// How a content file and its sidecar are made visible
    #[serde(default)]
    pub pairing: PairingPolicy,

    /// How exported files are named
    #[serde(default)]
    pub filename_policy: FilenamePolicy,
}

/// Display and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color_output: bool,

    /// Show a progress bar while scanning
    #[serde(default = "default_true")]
    pub progress_bar: bool,

    /// Style of the report tables
    #[serde(default)]
    pub table_style: TableStyle,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default)]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "media".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_batch_size() -> u32 {
    1000
}

fn default_assets_collection() -> String {
    "assets".to_string()
}

fn default_resource_bucket() -> String {
    "resources".to_string()
}

fn default_export_directory() -> PathBuf {
    PathBuf::from("./Data/MediaExport")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            timeout: default_timeout(),
            batch_size: default_batch_size(),
            assets_collection: default_assets_collection(),
            resource_bucket: default_resource_bucket(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
            pairing: PairingPolicy::default(),
            filename_policy: FilenamePolicy::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color_output: true,
            progress_bar: true,
            table_style: TableStyle::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file, None for the default location
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration, defaults if the file does not exist
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path(),
        };

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("Loaded config file {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an environment lookup
    ///
    /// Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(uri) = get(ENV_URI) {
            self.connection.uri = uri;
        }
        if let Some(database) = get(ENV_DATABASE) {
            self.connection.database = database;
        }
        if let Some(dir) = get(ENV_EXPORT_DIR) {
            self.export.directory = PathBuf::from(dir);
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.logging.level = level.parse()?;
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".media-export")
            .join("config.toml")
    }

    /// Save configuration to a file as a commented TOML document
    ///
    /// # Arguments
    /// * `path` - Path where to save the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_dir_exists(parent)?;
        }
        std::fs::write(path, self.to_toml_with_comments()?)?;
        Ok(())
    }

    /// Render the configuration as TOML with a comment above each section
    pub fn to_toml_with_comments(&self) -> Result<String> {
        let plain = toml::to_string_pretty(self)?;
        let mut doc = plain
            .parse::<DocumentMut>()
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let sections = [
            (
                "connection",
                "# MongoDB connection and asset repository location",
            ),
            (
                "export",
                "# Export target\n# pairing: atomic | loose\n# filename_policy: overwrite | prefix-identifier",
            ),
            (
                "display",
                "# Console output\n# table_style: ascii | modern | rounded | markdown | psql",
            ),
            (
                "logging",
                "# Diagnostics on stderr\n# level: error | warn | info | debug | trace",
            ),
        ];

        for (name, comment) in sections {
            if let Some(table) = doc.get_mut(name).and_then(|item| item.as_table_mut()) {
                table.decor_mut().set_prefix(format!("\n{comment}\n"));
            }
        }

        Ok(format!(
            "# media-export configuration\n{}",
            doc.to_string().trim_start()
        ))
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.connection.uri.trim().is_empty() {
            return Err(invalid("connection.uri", &self.connection.uri));
        }
        if self.connection.database.trim().is_empty() {
            return Err(invalid("connection.database", &self.connection.database));
        }
        if self.connection.batch_size == 0 {
            return Err(invalid("connection.batch_size", "0"));
        }
        if self.export.directory.as_os_str().is_empty() {
            return Err(invalid("export.directory", ""));
        }
        Ok(())
    }

    /// Get connection timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.timeout)
    }
}

fn invalid(field: &str, value: &str) -> crate::error::MediaExportError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: s.to_string(),
            }),
        }
    }
}
