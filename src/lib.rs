//! Data Directory Manager Library
//!
//! A scope-aware file cache for test fixtures. Data files are looked up in a
//! nested `global -> module -> class -> function` directory hierarchy beside
//! the tests, remote files are downloaded into it on demand with optional
//! MD5 verification, and staging contexts save a test's outputs back into
//! it for later tests to read.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use app::{DataDirManager, ScopeLevel, TestIdentity};
pub use errors::{AppError, Result};
