use std::path::PathBuf;
use std::{fmt, io};

use crate::error::mongo::describe_mongodb_error;

/// Crate-wide `Result` type using [`MediaExportError`] as the error.
pub type Result<T> = std::result::Result<T, MediaExportError>;

/// Top-level error type for media export operations.
#[derive(Debug)]
pub enum MediaExportError {
    /// Connection-related errors.
    Connection(ConnectionError),

    /// Configuration errors.
    Config(ConfigError),

    /// Errors raised while exporting a single asset or bootstrapping the
    /// export directory.
    Export(ExportError),

    /// Pipeline misuse, e.g. running a coordinator twice.
    Pipeline(String),

    /// I/O errors.
    Io(io::Error),

    /// MongoDB driver errors.
    MongoDb(mongodb::error::Error),

    /// JSON serialization errors.
    Serialization(serde_json::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to establish a connection.
    ConnectionFailed(String),

    /// Invalid connection URI.
    InvalidUri(String),

    /// Not currently connected to MongoDB.
    NotConnected,

    /// Ping command failed.
    PingFailed(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    ReadFailed { path: String, message: String },

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Generic configuration error.
    Generic(String),
}

/// Errors raised by the exporter.
///
/// Only [`ExportError::DirectoryBootstrap`] aborts a run; the other kinds are
/// reported per asset and the scan moves on.
#[derive(Debug)]
pub enum ExportError {
    /// The asset's content stream could not be opened or fully read.
    SourceRead { identifier: String, message: String },

    /// The content file or its sidecar could not be written.
    Write { path: PathBuf, message: String },

    /// The export base directory could not be created.
    DirectoryBootstrap { path: PathBuf, message: String },
}

impl ExportError {
    /// Whether the error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExportError::DirectoryBootstrap { .. })
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for MediaExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaExportError::Connection(e) => write!(f, "Connection error: {e}"),
            MediaExportError::Config(e) => write!(f, "Configuration error: {e}"),
            MediaExportError::Export(e) => write!(f, "Export error: {e}"),
            MediaExportError::Pipeline(msg) => write!(f, "Pipeline error: {msg}"),
            MediaExportError::Io(e) => write!(f, "I/O error: {e}"),
            MediaExportError::MongoDb(e) => write!(f, "{}", describe_mongodb_error(e)),
            MediaExportError::Serialization(e) => write!(f, "Serialization error: {e}"),
            MediaExportError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::InvalidUri(uri) => write!(f, "Invalid connection URI: {uri}"),
            ConnectionError::NotConnected => write!(f, "Not connected to MongoDB"),
            ConnectionError::PingFailed(msg) => write!(f, "Ping failed: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadFailed { path, message } => {
                write!(f, "Failed to read config file {path}: {message}")
            }
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::SourceRead {
                identifier,
                message,
            } => write!(f, "Failed to read content of asset {identifier}: {message}"),
            ExportError::Write { path, message } => {
                write!(f, "Failed to write {}: {message}", path.display())
            }
            ExportError::DirectoryBootstrap { path, message } => write!(
                f,
                "Failed to create export directory {}: {message}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for MediaExportError {}
impl std::error::Error for ConnectionError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ExportError {}

/* ========================= Conversions to MediaExportError ========================= */

impl From<io::Error> for MediaExportError {
    fn from(err: io::Error) -> Self {
        MediaExportError::Io(err)
    }
}

impl From<mongodb::error::Error> for MediaExportError {
    fn from(err: mongodb::error::Error) -> Self {
        MediaExportError::MongoDb(err)
    }
}

impl From<serde_json::Error> for MediaExportError {
    fn from(err: serde_json::Error) -> Self {
        MediaExportError::Serialization(err)
    }
}

impl From<toml::de::Error> for MediaExportError {
    fn from(err: toml::de::Error) -> Self {
        MediaExportError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for MediaExportError {
    fn from(err: toml::ser::Error) -> Self {
        MediaExportError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<ConnectionError> for MediaExportError {
    fn from(err: ConnectionError) -> Self {
        MediaExportError::Connection(err)
    }
}

impl From<ConfigError> for MediaExportError {
    fn from(err: ConfigError) -> Self {
        MediaExportError::Config(err)
    }
}

impl From<ExportError> for MediaExportError {
    fn from(err: ExportError) -> Self {
        MediaExportError::Export(err)
    }
}

impl From<String> for MediaExportError {
    fn from(msg: String) -> Self {
        MediaExportError::Generic(msg)
    }
}

impl From<&str> for MediaExportError {
    fn from(msg: &str) -> Self {
        MediaExportError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_directory_bootstrap_is_fatal() {
        let bootstrap = ExportError::DirectoryBootstrap {
            path: PathBuf::from("/readonly/export"),
            message: "permission denied".to_string(),
        };
        let read = ExportError::SourceRead {
            identifier: "a1".to_string(),
            message: "unexpected eof".to_string(),
        };
        let write = ExportError::Write {
            path: PathBuf::from("out/a.jpg"),
            message: "disk full".to_string(),
        };

        assert!(bootstrap.is_fatal());
        assert!(!read.is_fatal());
        assert!(!write.is_fatal());
    }

    #[test]
    fn test_export_error_display() {
        let err: MediaExportError = ExportError::SourceRead {
            identifier: "a1".to_string(),
            message: "unexpected eof".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Export error: Failed to read content of asset a1: unexpected eof"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "connection.batch_size".to_string(),
            value: "0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value '0' for field 'connection.batch_size'"
        );
    }
}
