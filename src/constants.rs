//! Application constants for the data directory manager
//!
//! This module centralizes all constants used throughout the crate,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Force verbose diagnostics ("1", "true", "yes")
    pub const VERBOSE: &str = "DATADIR_MGR_VERBOSE";

    /// Force progress bars on or off
    pub const PROGRESS: &str = "DATADIR_MGR_PROGRESS";

    /// Override the name of the global data subdirectory
    pub const SUBDIR: &str = "DATADIR_MGR_SUBDIR";
}

/// Cache directory layout
pub mod layout {
    /// Name of the global data directory beside the test file
    pub const GLOBAL_SUBDIR: &str = "data";

    /// Label of the requesting test's own scope chain
    pub const REQUEST_CHAIN: &str = "request";

    /// Separator between package segments in a module name
    pub const MODULE_SEPARATOR: char = '.';

    /// Root-level directory names that look like test modules and are never scanned
    pub const TEST_DIR_PATTERNS: &[&str] = &["test_*", "*_test"];
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for in-flight downloads
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Suffix of gzip-compressed remote files
    pub const GZIP_SUFFIX: &str = ".gz";

    /// Suffix of companion checksum files
    pub const MD5_SUFFIX: &str = ".md5";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("datadir-mgr/", env!("CARGO_PKG_VERSION"));

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Progress display constants
pub mod progress {
    /// Template for byte-sized transfer bars
    pub const TRANSFER_TEMPLATE: &str =
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta}) {msg}";

    /// Template used when the transfer size is unknown
    pub const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {msg}";

    /// Characters for the filled/current/empty parts of the bar
    pub const BAR_CHARS: &str = "##-";
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_FILE_NAME: &str = "datadir-mgr.toml";

    /// Directory under the user config dir
    pub const APP_DIR_NAME: &str = "datadir-mgr";

    /// File name inside the user config directory
    pub const USER_FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use files::{GZIP_SUFFIX, MD5_SUFFIX, TEMP_FILE_SUFFIX};
pub use http::USER_AGENT;
pub use layout::{GLOBAL_SUBDIR, REQUEST_CHAIN};
