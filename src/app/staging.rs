//! Staging context: run code inside a scratch directory
//!
//! Entering copies the requested inputs (found through the scope registry)
//! into the scratch directory and makes it the working directory. Leaving
//! optionally saves every new file back into a scope directory and always
//! restores the original working directory, even when the wrapped code
//! panicked.
//!
//! The working directory is process-wide state: only one staging context
//! should be active at a time.

use std::env;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};

use tracing::error;

use super::manager::DataDirManager;
use super::progress::sink_for;
use super::scanner::Exclusions;
use super::scope::ScopeLevel;
use crate::errors::{StagingError, StagingResult};

/// Parameters of one staging context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOptions {
    /// Relative paths to copy into the scratch directory
    pub inputs: Vec<PathBuf>,
    /// Save new files into `out_scope` on exit
    pub save_outputs: bool,
    /// Scope level outputs are saved to
    pub out_scope: ScopeLevel,
    /// Extra exclusions for the output scan; staged inputs are always excluded
    pub exclusions: Exclusions,
    /// Draw progress bars for copies
    pub progress: bool,
}

impl StageOptions {
    /// Stage nothing and save nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Add input paths
    pub fn inputs<I, P>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Save outputs to `scope` on exit
    pub fn save_outputs(mut self, scope: ScopeLevel) -> Self {
        self.save_outputs = true;
        self.out_scope = scope;
        self
    }

    /// Set exclusions for the output scan
    pub fn exclusions(mut self, exclusions: Exclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Enable or disable copy progress bars
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

/// Active staging context; leaving it saves outputs and restores the cwd
///
/// Call [`StagingGuard::finish`] to observe errors from leaving. A guard
/// dropped without `finish` still leaves the context and logs any error.
#[derive(Debug)]
pub struct StagingGuard<'a> {
    manager: &'a DataDirManager,
    options: StageOptions,
    tmp_dir: PathBuf,
    original_dir: PathBuf,
    active: bool,
}

impl<'a> StagingGuard<'a> {
    pub(crate) fn enter(manager: &'a DataDirManager, options: StageOptions) -> StagingResult<Self> {
        let original_dir = env::current_dir().map_err(|e| StagingError::io(".", e))?;
        let tmp_dir = manager.tmp_path().to_path_buf();
        fs::create_dir_all(&tmp_dir).map_err(|e| StagingError::io(&tmp_dir, e))?;

        let mut sources = Vec::with_capacity(options.inputs.len());
        for input in &options.inputs {
            if !is_scope_relative(input) {
                return Err(StagingError::InvalidInput {
                    path: input.clone(),
                });
            }
            sources.push((manager.get(input)?, input));
        }

        manager
            .observer()
            .staging_started(sources.len(), &tmp_dir);

        let mut progress = sink_for(options.progress);
        let total: u64 = sources
            .iter()
            .filter_map(|(src, _)| fs::metadata(src).ok())
            .map(|meta| meta.len())
            .sum();
        progress.start("staging inputs", Some(total));
        for (src, input) in &sources {
            let dest = tmp_dir.join(input);
            let copied = copy_preserving(src, &dest).map_err(|e| StagingError::io(&dest, e))?;
            progress.advance(copied);
        }
        progress.finish();

        env::set_current_dir(&tmp_dir).map_err(|e| StagingError::io(&tmp_dir, e))?;

        Ok(Self {
            manager,
            options,
            tmp_dir,
            original_dir,
            active: true,
        })
    }

    /// Scratch directory the context runs in
    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    /// Working directory restored on exit
    pub fn original_dir(&self) -> &Path {
        &self.original_dir
    }

    /// Leave the context, returning the first error from saving or restoring
    pub fn finish(mut self) -> StagingResult<Vec<PathBuf>> {
        self.leave()
    }

    fn leave(&mut self) -> StagingResult<Vec<PathBuf>> {
        if !self.active {
            return Ok(Vec::new());
        }
        self.active = false;

        let saved = if self.options.save_outputs {
            let exclusions = self
                .options
                .exclusions
                .clone()
                .with_paths(self.options.inputs.iter().cloned());
            self.manager.save_tree(
                &self.tmp_dir,
                self.options.out_scope,
                &exclusions,
                self.options.progress,
            )
        } else {
            Ok(Vec::new())
        };

        let restored = env::set_current_dir(&self.original_dir)
            .map_err(|e| StagingError::io(&self.original_dir, e));

        let saved = saved?;
        restored?;
        Ok(saved)
    }
}

impl Drop for StagingGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            error!("Failed to leave staging directory {}: {}", self.tmp_dir.display(), e);
        }
    }
}

/// Run `f` inside a staging context
///
/// A panic in `f` is caught so outputs are saved and the working directory
/// restored; the panic then resumes.
pub fn run_staged<R>(
    manager: &DataDirManager,
    options: StageOptions,
    f: impl FnOnce() -> R,
) -> StagingResult<R> {
    let guard = StagingGuard::enter(manager, options)?;
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    let left = guard.finish();

    match outcome {
        Ok(value) => left.map(|_| value),
        Err(payload) => {
            if let Err(e) = left {
                error!("Failed to leave staging directory after panic: {}", e);
            }
            panic::resume_unwind(payload)
        }
    }
}

/// Relative path that stays below the directory it is joined to
fn is_scope_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)))
}

/// Copy `src` to `dest`, creating parents and keeping permissions and times
pub(crate) fn copy_preserving(src: &Path, dest: &Path) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let copied = fs::copy(src, dest)?;

    let meta = fs::metadata(src)?;
    let atime = filetime::FileTime::from_last_access_time(&meta);
    let mtime = filetime::FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dest, atime, mtime)?;

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    #[test]
    fn test_copy_preserving_keeps_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src.txt");
        fs::write(&src, "payload").unwrap();
        let old = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&src, old).unwrap();

        let dest = temp_dir.path().join("nested/dir/dest.txt");
        let copied = copy_preserving(&src, &dest).unwrap();

        assert_eq!(copied, 7);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "payload");
        let meta = fs::metadata(&dest).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), old);
    }

    #[test]
    fn test_scope_relative_inputs() {
        assert!(is_scope_relative(Path::new("a.txt")));
        assert!(is_scope_relative(Path::new("./sub/b.txt")));
        assert!(!is_scope_relative(Path::new("/etc/passwd")));
        assert!(!is_scope_relative(Path::new("../outside.txt")));
        assert!(!is_scope_relative(Path::new("sub/../../x")));
        assert!(!is_scope_relative(Path::new("")));
        assert!(!is_scope_relative(Path::new(".")));
    }

    #[test]
    fn test_stage_options_builder() {
        let options = StageOptions::new()
            .inputs(["a.txt", "sub/b.txt"])
            .save_outputs(ScopeLevel::Function)
            .exclusions(Exclusions::new().with_patterns(["*.log"]))
            .progress(true);

        assert_eq!(
            options.inputs,
            vec![PathBuf::from("a.txt"), PathBuf::from("sub/b.txt")]
        );
        assert!(options.save_outputs);
        assert_eq!(options.out_scope, ScopeLevel::Function);
        assert_eq!(options.exclusions.patterns(), ["*.log".to_string()]);
        assert!(options.progress);
    }

    #[test]
    fn test_default_options_save_nothing() {
        let options = StageOptions::default();
        assert!(options.inputs.is_empty());
        assert!(!options.save_outputs);
        assert_eq!(options.out_scope, ScopeLevel::Module);
    }
}
