//! Error types for the data directory manager
//!
//! Each concern of the manager has its own error enum so callers can match on
//! exactly the failure they care about. All of them roll up into [`AppError`]
//! for code (such as the CLI) that only needs to report a failure.
//!
//! None of these errors are retried anywhere: every failure is surfaced to the
//! caller as soon as it happens.

use std::path::PathBuf;

use thiserror::Error;

use crate::app::scope::ScopeLevel;

/// Scope resolution errors
#[derive(Error, Debug)]
pub enum ScopeError {
    /// Scope level name is not one of function/class/module/global
    #[error("Unknown datadir scope: {name}")]
    UnknownLevel { name: String },

    /// Scope level exists but the requesting test has no such level
    #[error("Scope {level} not found in request")]
    NotInRequest { level: ScopeLevel },

    /// Scope directory could not be created
    #[error("Failed to create scope directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File lookup errors
#[derive(Error, Debug)]
pub enum LookupError {
    /// Relative path is absent from every searched scope
    #[error("Path '{}' not found in the datadir scopes {searched:?}", path.display())]
    NotFound {
        path: PathBuf,
        searched: Vec<String>,
    },
}

/// Directory scanning errors
#[derive(Error, Debug)]
pub enum ScanError {
    /// Exclusion glob could not be compiled
    #[error("Invalid exclusion pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Directory walk failed part way through
    #[error("Failed to walk directory")]
    Walk(#[from] walkdir::Error),
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Required request parameter missing
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Target scope could not be resolved
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// HTTP transport failure or error status, passed through unchanged
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Downloaded content does not match the published checksum
    #[error("Hash of {file}={actual}, expected {expected}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// Invalid hash format
    #[error("Invalid hash format: {hash}. Expected MD5 hex string")]
    InvalidHash { hash: String },

    /// Gzip stream could not be decompressed
    #[error("Failed to decompress {path}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Staging context errors
#[derive(Error, Debug)]
pub enum StagingError {
    /// An input file could not be found in any scope
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Output scope could not be resolved
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Scratch directory scan failed
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Input path is absolute or leaves the scope directory
    #[error("Staged input must be a relative path inside a scope: {path}")]
    InvalidInput { path: PathBuf },

    /// Copy, directory change or directory creation failed
    #[error("Staging I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StagingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Missing required configuration field
    #[error("{field} must be specified")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration file could not be read or written
    #[error("Configuration file I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Shorthand for a missing required parameter
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Scope error
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Lookup error
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Scan error
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Staging error
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Whether this error is a checksum mismatch after download
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, AppError::Download(DownloadError::HashMismatch { .. }))
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Scope(ScopeError::UnknownLevel { .. })
            | AppError::Download(DownloadError::Config(_))
            | AppError::Download(DownloadError::Scope(ScopeError::UnknownLevel { .. }))
            | AppError::Config(_) => "config",
            AppError::Scope(_) | AppError::Download(DownloadError::Scope(_)) => "scope",
            AppError::Lookup(_) | AppError::Staging(StagingError::Lookup(_)) => "not-found",
            AppError::Download(DownloadError::HashMismatch { .. }) => "integrity",
            AppError::Download(_) => "download",
            AppError::Scan(_) => "scan",
            AppError::Staging(_) => "staging",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Scope result type alias
pub type ScopeResult<T> = std::result::Result<T, ScopeError>;

/// Lookup result type alias
pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Scan result type alias
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Staging result type alias
pub type StagingResult<T> = std::result::Result<T, StagingError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_searched_chains() {
        let err = LookupError::NotFound {
            path: PathBuf::from("data1.txt"),
            searched: vec!["saved data".to_string(), "request".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("data1.txt"));
        assert!(message.contains("\"saved data\""));
        assert!(message.contains("\"request\""));
    }

    #[test]
    fn test_hash_mismatch_names_both_digests() {
        let err = DownloadError::HashMismatch {
            file: "LICENSE.gz".to_string(),
            expected: "aaaa".to_string(),
            actual: "bbbb".to_string(),
        };
        assert_eq!(err.to_string(), "Hash of LICENSE.gz=bbbb, expected aaaa");
    }

    #[test]
    fn test_categories() {
        let missing = AppError::Download(DownloadError::Config(ConfigError::missing(
            "download_url",
        )));
        assert_eq!(missing.category(), "config");

        let unknown = AppError::Scope(ScopeError::UnknownLevel {
            name: "session".to_string(),
        });
        assert_eq!(unknown.category(), "config");

        let absent = AppError::Scope(ScopeError::NotInRequest {
            level: ScopeLevel::Class,
        });
        assert_eq!(absent.category(), "scope");

        let mismatch = AppError::Download(DownloadError::HashMismatch {
            file: "x".to_string(),
            expected: "a".to_string(),
            actual: "b".to_string(),
        });
        assert_eq!(mismatch.category(), "integrity");
        assert!(mismatch.is_integrity_failure());
        assert!(!missing.is_integrity_failure());
    }

    #[test]
    fn test_missing_field_message() {
        let err = ConfigError::missing("download_url");
        assert_eq!(err.to_string(), "download_url must be specified");
    }
}
