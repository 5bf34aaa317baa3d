//! Prelude module for the data directory manager
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use datadir_mgr::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use datadir_mgr::prelude::*;
//!
//! fn example() -> Result<()> {
//!     let manager = DataDirManager::new(
//!         TestIdentity::new("tests.io_test").with_function("test_read"),
//!         "tests",
//!         "/tmp/scratch",
//!     )?;
//!     let input = manager.get("input.csv")?;
//!     println!("{}", input.display());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components that are used in most tests
pub use crate::app::{
    DataDirManager,
    DataDirObserver,
    DownloadReport,
    DownloadRequest,
    Exclusions,
    ScopeLevel,
    StageOptions,
    TestIdentity,
    TracingObserver,
};

// Configuration
pub use crate::config::DataDirConfig;

// Identity of the enclosing module
pub use crate::datadir_identity;

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;
