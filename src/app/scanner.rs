//! Recursive file listing with path and glob exclusions
//!
//! Used to enumerate a scope directory (`paths_from_scope`) and to find the
//! outputs of a staged test before they are saved back into the cache.
//! Root-level directories named like test modules (`test_*`, `*_test`) are
//! never descended into, so a scope holding per-test subdirectories does not
//! leak those into a listing of its own files.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::constants::layout;
use crate::errors::{ScanError, ScanResult};

/// Paths and glob patterns to leave out of a scan
///
/// Paths are matched exactly against root-relative paths; a path naming a
/// top-level directory excludes that directory's whole subtree. Patterns
/// match from the right like shell globs on the trailing path components,
/// so `*.log` excludes log files at any depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    paths: Vec<PathBuf>,
    patterns: Vec<String>,
}

impl Exclusions {
    /// No exclusions
    pub fn new() -> Self {
        Self::default()
    }

    /// Add excluded root-relative paths
    pub fn with_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add excluded glob patterns
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Excluded paths
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Excluded patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Result of a directory scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Files that passed every exclusion
    pub files: Vec<PathBuf>,
    /// Files seen before path and pattern exclusions were applied
    pub considered: usize,
}

/// Recursive file lister over one root directory
#[derive(Debug, Clone)]
pub struct FileScanner {
    root: PathBuf,
    exclusions: Exclusions,
    relative: bool,
}

impl FileScanner {
    /// Scanner over `root` returning absolute (root-joined) paths
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclusions: Exclusions::default(),
            relative: false,
        }
    }

    /// Use these exclusions; the caller's value is cloned, never extended
    pub fn with_exclusions(mut self, exclusions: &Exclusions) -> Self {
        self.exclusions = exclusions.clone();
        self
    }

    /// Return paths relative to the root instead of joined onto it
    pub fn relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    /// Walk the root and collect every regular file not excluded
    ///
    /// A missing root yields an empty report: nothing has been saved there
    /// yet. Order follows the filesystem and is not otherwise guaranteed.
    pub fn scan(&self) -> ScanResult<ScanReport> {
        let mut report = ScanReport::default();
        if !self.root.is_dir() {
            return Ok(report);
        }

        let pattern_set = build_pattern_set(&self.exclusions.patterns)?;
        let test_dirs = build_name_set(layout::TEST_DIR_PATTERNS)?;
        let excluded: HashSet<PathBuf> = self
            .exclusions
            .paths
            .iter()
            .map(|p| normalize(p))
            .collect();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.depth() == 1
                    && entry.file_type().is_dir()
                    && test_dirs.is_match(entry.file_name()))
            });

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let relpath = normalize(path.strip_prefix(&self.root).unwrap_or(path));
            report.considered += 1;

            let top_excluded = top_parent(&relpath).map_or(false, |top| excluded.contains(top));
            if excluded.contains(&relpath) || top_excluded {
                continue;
            }
            if pattern_set.is_match(&relpath) {
                continue;
            }

            report.files.push(if self.relative {
                relpath
            } else {
                path.to_path_buf()
            });
        }

        Ok(report)
    }
}

/// First component of a multi-component relative path
fn top_parent(relpath: &Path) -> Option<&Path> {
    let mut components = relpath.components();
    let first = components.next()?;
    components.next()?;
    Some(Path::new(first.as_os_str()))
}

/// Drop `.` components so `./a/b` and `a/b` compare equal
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Right-anchored glob set: `p` matches `p` itself or any `**/p`
fn build_pattern_set(patterns: &[String]) -> ScanResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(component_glob(pattern)?);
        if !pattern.starts_with('/') && !pattern.starts_with("**") {
            builder.add(component_glob(&format!("**/{}", pattern))?);
        }
    }
    builder.build().map_err(|source| ScanError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}

fn build_name_set(patterns: &[&str]) -> ScanResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(|source| ScanError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?);
    }
    builder.build().map_err(|source| ScanError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}

fn component_glob(pattern: &str) -> ScanResult<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| ScanError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}
