//! Error types for configuration loading and sweeping.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a sweep.
///
/// Failures while archiving a single node are not represented here; they are
/// reported per node and never stop the traversal.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive root could not be prepared.
    #[error("Cannot prepare archive root {path}: {source}")]
    ArchiveRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root and archive resolve to nested locations on disk.
    #[error("Archive {archive} and root {root} overlap")]
    ArchiveOverlap { root: PathBuf, archive: PathBuf },

    /// The sweep was cancelled between two nodes.
    #[error("Sweep cancelled")]
    Cancelled,

    /// The blocking sweep task failed to complete.
    #[error("Sweep task failed: {message}")]
    Task { message: String },
}

impl SweepError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether this error was caused by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised while loading or validating configuration.
///
/// All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// The configuration file could not be opened.
    #[error("Error opening configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not a valid properties file.
    #[error("Error reading configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: java_properties::PropertiesError,
    },

    /// A required key is absent.
    #[error("Missing configuration key: {key}")]
    MissingKey { key: &'static str },

    /// A key holds a value that cannot be parsed.
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// The configuration is structurally invalid.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub(crate) fn invalid_value(
        key: &'static str,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidValue {
            key,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}
