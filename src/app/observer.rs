//! Diagnostics hooks for the data directory manager
//!
//! The manager reports what it is doing through a [`DataDirObserver`]
//! instead of printing. The default [`TracingObserver`] turns each hook into
//! a structured `tracing` event; verbose mode raises those events from DEBUG
//! to INFO so they show up under a default subscriber filter.

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use super::scope::ScopeMatch;

/// Receiver of manager diagnostics; every hook defaults to doing nothing
pub trait DataDirObserver: Send + Sync + fmt::Debug {
    /// A lookup matched a file
    fn scope_matched(&self, _requested: &Path, _found: &ScopeMatch) {}

    /// A listing was requested for a scope directory that does not exist
    fn scope_missing(&self, _dir: &Path) {}

    /// A scan kept `kept` of `considered` files
    fn files_filtered(&self, _kept: usize, _considered: usize) {}

    /// A scope listing found `count` files
    fn scope_listed(&self, _count: usize, _dir: &Path) {}

    /// A download was skipped because the file is already cached
    fn download_cached(&self, _path: &Path) {}

    /// A remote file is about to be fetched
    fn download_started(&self, _url: &str, _checked: bool) {}

    /// A downloaded file was stored at its final path
    fn download_finished(&self, _path: &Path, _gunzipped: bool, _checked: bool) {}

    /// Files are being copied into the scratch directory
    fn staging_started(&self, _count: usize, _tmp_dir: &Path) {}

    /// Outputs are being saved out of the scratch directory
    fn saving_outputs(&self, _count: usize, _tmp_dir: &Path) {}

    /// One file is being saved into a scope directory
    fn saving_path(&self, _path: &Path, _scope_dir: &Path) {}
}

/// Observer that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl DataDirObserver for SilentObserver {}

/// Observer that emits `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver {
    verbose: bool,
}

impl TracingObserver {
    /// Log at INFO when `verbose`, otherwise at DEBUG
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Whether events are raised to INFO
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

macro_rules! emit {
    ($self:ident, $($arg:tt)+) => {
        if $self.verbose {
            info!($($arg)+);
        } else {
            debug!($($arg)+);
        }
    };
}

impl DataDirObserver for TracingObserver {
    fn scope_matched(&self, requested: &Path, found: &ScopeMatch) {
        emit!(
            self,
            chain = %found.chain,
            level = %found.level,
            name = %found.name,
            "path \"{}\" found in scope \"{}\" level \"{}\" name \"{}\"",
            requested.display(),
            found.chain,
            found.level,
            found.name
        );
    }

    fn scope_missing(&self, dir: &Path) {
        emit!(self, "No extant datadir at requested scope {}", dir.display());
    }

    fn files_filtered(&self, kept: usize, considered: usize) {
        emit!(
            self,
            "{} out of {} file paths passed exclusion.",
            kept,
            considered
        );
    }

    fn scope_listed(&self, count: usize, dir: &Path) {
        let name = dir.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        emit!(self, "Found {} paths from scope {}.", count, name);
    }

    fn download_cached(&self, path: &Path) {
        emit!(self, "already cached, skipping download of {}", path.display());
    }

    fn download_started(&self, url: &str, checked: bool) {
        if checked {
            emit!(self, "downloading {} with MD5 check", url);
        } else {
            emit!(self, "downloading {}", url);
        }
    }

    fn download_finished(&self, path: &Path, gunzipped: bool, checked: bool) {
        let check = if checked { "MD5 checked " } else { "" };
        if gunzipped {
            emit!(self, "ungzipped {}file to {}", check, path.display());
        } else {
            emit!(self, "downloaded {}file to {}", check, path.display());
        }
    }

    fn staging_started(&self, count: usize, tmp_dir: &Path) {
        emit!(self, "Copying {} files into {}", count, tmp_dir.display());
    }

    fn saving_outputs(&self, count: usize, tmp_dir: &Path) {
        emit!(
            self,
            "Saving {} output files from {}",
            count,
            tmp_dir.display()
        );
    }

    fn saving_path(&self, path: &Path, scope_dir: &Path) {
        emit!(
            self,
            "saving \"{}\" to {}",
            path.display(),
            scope_dir.display()
        );
    }
}
