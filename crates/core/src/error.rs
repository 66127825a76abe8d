//! Error types for fsg-core
//!
//! Provides a unified error type shared by the storage adapter and the
//! HTTP handlers.

use thiserror::Error;

/// Result type alias for fsg-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for storage operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed route segments or object key
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other backend or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether this error means the requested object does not exist
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("docs/report.txt".into());
        assert_eq!(err.to_string(), "Not found: docs/report.txt");

        let err = Error::InvalidPath("file name cannot be empty".into());
        assert_eq!(err.to_string(), "Invalid path: file name cannot be empty");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("a/b".into()).is_not_found());
        assert!(!Error::Network("timeout".into()).is_not_found());
        assert!(!Error::InvalidPath("a".into()).is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::other("broken pipe");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
