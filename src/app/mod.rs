//! Core logic of the data directory manager
//!
//! - [`scope`] - test identities and the scope chains they resolve to
//! - [`scanner`] - recursive file listing with exclusions
//! - [`download`] - verified downloads into a scope directory
//! - [`staging`] - scratch-directory contexts that save outputs back
//! - [`manager`] - [`DataDirManager`], the surface tests use
//!
//! # Examples
//!
//! ```rust,no_run
//! use datadir_mgr::app::{DataDirManager, StageOptions, ScopeLevel};
//! use datadir_mgr::datadir_identity;
//!
//! # fn example() -> datadir_mgr::errors::Result<()> {
//! let manager = DataDirManager::new(
//!     datadir_identity!(function = "test_convert"),
//!     "tests",
//!     "/tmp/scratch",
//! )?;
//!
//! let options = StageOptions::new()
//!     .inputs(["input.csv"])
//!     .save_outputs(ScopeLevel::Function);
//! manager.in_tmp_dir(options, || {
//!     std::fs::write("output.csv", "converted").unwrap();
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod download;
pub mod hash;
pub mod manager;
pub mod observer;
pub mod progress;
pub mod scanner;
pub mod scope;
pub mod staging;

// Re-export main public API
pub use download::{ClientConfig, DownloadReport, DownloadRequest, Downloader};
pub use hash::{HashTracker, Md5Hash};
pub use manager::DataDirManager;
pub use observer::{DataDirObserver, SilentObserver, TracingObserver};
pub use progress::{NoProgress, TransferBar, TransferProgress};
pub use scanner::{Exclusions, FileScanner, ScanReport};
pub use scope::{Scope, ScopeChain, ScopeLevel, ScopeMatch, ScopeRegistry, TestIdentity};
pub use staging::{StageOptions, StagingGuard};
