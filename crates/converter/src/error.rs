use std::path::PathBuf;
use thiserror::Error;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that abort a conversion run
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The upstream corpus violated a metadata contract the conversion relies on
    #[error("Integrity error in {test}: {reason}")]
    Integrity { test: String, reason: String },

    /// A shared include file could not be read
    #[error("Missing include file {name} ({path})")]
    MissingInclude {
        name: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be decoded
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Reading or writing a file failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failed
    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    /// Invalid input tree
    #[error("Invalid corpus path: {0}")]
    InvalidPath(String),
}

impl ConvertError {
    /// Create an integrity error for the given test
    pub fn integrity(test: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Integrity {
            test: test.into(),
            reason: reason.into(),
        }
    }

    /// Create an IO error for `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error was raised by contradictory or malformed test metadata
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }
}
