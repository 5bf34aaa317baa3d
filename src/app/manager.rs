//! Data directory manager: the API a test uses for its fixtures
//!
//! A [`DataDirManager`] is built for one test from its [`TestIdentity`], the
//! directory the test lives in and a scratch directory. It owns the scope
//! registry and answers lookups, downloads remote files into a scope, lists
//! scope contents and runs staging contexts that move files between the
//! cache and the scratch directory.
//!
//! # Examples
//!
//! ```rust,no_run
//! use datadir_mgr::prelude::*;
//!
//! # async fn example() -> datadir_mgr::errors::Result<()> {
//! let identity = TestIdentity::new("tests.io_test").with_function("test_read");
//! let manager = DataDirManager::new(identity, "tests", "/tmp/scratch")?;
//!
//! let request = DownloadRequest::new("https://example.com/data/", ["LICENSE"])
//!     .scope(ScopeLevel::Module)
//!     .gunzip(true)
//!     .verify_md5(true);
//! manager.download(&request).await?;
//!
//! let license = manager.get("LICENSE")?;
//! assert!(license.exists());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::download::{DownloadReport, DownloadRequest, Downloader};
use super::observer::{DataDirObserver, TracingObserver};
use super::progress::{sink_for, TransferProgress};
use super::scanner::{Exclusions, FileScanner};
use super::scope::{ScopeChain, ScopeLevel, ScopeMatch, ScopeRegistry, TestIdentity};
use super::staging::{copy_preserving, run_staged, StageOptions, StagingGuard};
use crate::config::{DataDirConfig, DataDirSettings};
use crate::errors::{
    DownloadResult, LookupResult, Result, ScanResult, ScopeError, ScopeResult, StagingError,
    StagingResult,
};

/// Scope-aware fixture cache for one test
#[derive(Debug)]
pub struct DataDirManager {
    identity: TestIdentity,
    datapath: PathBuf,
    tmp_path: PathBuf,
    settings: DataDirSettings,
    request: ScopeChain,
    registry: ScopeRegistry,
    downloader: Downloader,
    observer: Arc<dyn DataDirObserver>,
}

impl DataDirManager {
    /// Manager configured from the discovered config file and environment
    ///
    /// `test_dir` is the directory holding the test; the cache lives in its
    /// `data` subdirectory unless configured otherwise. Relative paths are
    /// resolved against the current directory now, so later working
    /// directory changes do not affect them.
    pub fn new(
        identity: TestIdentity,
        test_dir: impl AsRef<Path>,
        tmp_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let config = DataDirConfig::load(None)?;
        Self::with_config(identity, test_dir, tmp_path, &config)
    }

    /// Manager configured from `config`
    pub fn with_config(
        identity: TestIdentity,
        test_dir: impl AsRef<Path>,
        tmp_path: impl AsRef<Path>,
        config: &DataDirConfig,
    ) -> Result<Self> {
        let settings = config.datadir.clone();
        let datapath = absolute(test_dir.as_ref())?.join(&settings.global_subdir);
        let tmp_path = absolute(tmp_path.as_ref())?;

        let request = ScopeChain::from_identity(
            &datapath,
            &identity,
            true,
            settings.strip_package_prefix,
        );
        let registry = ScopeRegistry::new(request.clone());
        let downloader = Downloader::new(&config.client.to_runtime_config())?;
        let observer: Arc<dyn DataDirObserver> = Arc::new(TracingObserver::new(settings.verbose));

        Ok(Self {
            identity,
            datapath,
            tmp_path,
            settings,
            request,
            registry,
            downloader,
            observer,
        })
    }

    /// Replace the diagnostics observer
    pub fn with_observer(mut self, observer: Arc<dyn DataDirObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Identity of the requesting test
    pub fn identity(&self) -> &TestIdentity {
        &self.identity
    }

    /// Global data directory
    pub fn datapath(&self) -> &Path {
        &self.datapath
    }

    /// Scratch directory used by staging contexts
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Scope chain of the requesting test
    pub fn request_chain(&self) -> &ScopeChain {
        &self.request
    }

    /// All registered chains
    pub fn registry(&self) -> &ScopeRegistry {
        &self.registry
    }

    /// Scope level used when none is given
    pub fn default_scope(&self) -> ScopeLevel {
        self.settings.default_scope
    }

    pub(crate) fn observer(&self) -> &dyn DataDirObserver {
        self.observer.as_ref()
    }

    /// Find `relative_path` and report where it was found
    pub fn locate(&self, relative_path: impl AsRef<Path>) -> LookupResult<ScopeMatch> {
        let relative_path = relative_path.as_ref();
        let found = self.registry.lookup(relative_path)?;
        self.observer.scope_matched(relative_path, &found);
        Ok(found)
    }

    /// Absolute path of `relative_path` in the first scope that has it
    pub fn get(&self, relative_path: impl AsRef<Path>) -> LookupResult<PathBuf> {
        self.locate(relative_path).map(|found| found.path)
    }

    /// Register the chain of another test under `label`
    ///
    /// The global tier is left out of extra chains; the request chain
    /// already searches it.
    pub fn add_scope(&mut self, label: impl Into<String>, identity: &TestIdentity) {
        let chain = ScopeChain::from_identity(
            &self.datapath,
            identity,
            false,
            self.settings.strip_package_prefix,
        );
        self.registry.register(label, chain);
    }

    /// Directory of the request chain at `level`, optionally creating it
    pub fn scope_to_path(&self, level: ScopeLevel, create: bool) -> ScopeResult<PathBuf> {
        let scope = self
            .request
            .get(level)
            .ok_or(ScopeError::NotInRequest { level })?;
        let path = scope.path().to_path_buf();

        if create {
            fs::create_dir_all(&path).map_err(|source| ScopeError::CreateDir {
                path: path.clone(),
                source,
            })?;
        }
        Ok(path)
    }

    /// Files saved under the most specific scope of `identity`
    ///
    /// Paths are relative to that scope directory. A scope that has never
    /// been written to yields an empty list.
    pub fn paths_from_scope(
        &self,
        identity: &TestIdentity,
        exclusions: &Exclusions,
    ) -> ScanResult<Vec<PathBuf>> {
        let chain = ScopeChain::from_identity(
            &self.datapath,
            identity,
            true,
            self.settings.strip_package_prefix,
        );
        let Some((_, scope)) = chain.most_specific() else {
            return Ok(Vec::new());
        };

        let dir = scope.path();
        if !dir.is_dir() {
            self.observer.scope_missing(dir);
            return Ok(Vec::new());
        }

        let report = FileScanner::new(dir)
            .with_exclusions(exclusions)
            .relative(true)
            .scan()?;
        self.observer
            .files_filtered(report.files.len(), report.considered);
        self.observer.scope_listed(report.files.len(), dir);
        Ok(report.files)
    }

    /// Download the files of `request` into its scope directory
    pub async fn download(&self, request: &DownloadRequest) -> DownloadResult<DownloadReport> {
        let mut progress = sink_for(request.show_progress || self.settings.progress);
        self.download_with_progress(request, progress.as_mut()).await
    }

    /// Download reporting transfer progress to `progress`
    pub async fn download_with_progress(
        &self,
        request: &DownloadRequest,
        progress: &mut dyn TransferProgress,
    ) -> DownloadResult<DownloadReport> {
        // Validate before creating any directory
        request.validate()?;
        let target_dir = self.scope_to_path(request.scope, true)?;
        self.downloader
            .fetch(request, &target_dir, self.observer.as_ref(), progress)
            .await
    }

    /// Enter a staging context
    pub fn stage(&self, options: StageOptions) -> StagingResult<StagingGuard<'_>> {
        StagingGuard::enter(self, options)
    }

    /// Run `f` inside a staging context
    pub fn in_tmp_dir<R>(&self, options: StageOptions, f: impl FnOnce() -> R) -> StagingResult<R> {
        run_staged(self, options, f)
    }

    /// Save the current directory's files into the `scope` directory
    ///
    /// Returns the saved paths inside the scope directory.
    pub fn save_outputs(
        &self,
        scope: ScopeLevel,
        exclusions: &Exclusions,
        show_progress: bool,
    ) -> StagingResult<Vec<PathBuf>> {
        let cwd = env::current_dir().map_err(|e| StagingError::io(".", e))?;
        self.save_tree(&cwd, scope, exclusions, show_progress)
    }

    /// Copy one file into the `scope` directory at the same relative path
    ///
    /// A relative `path` is taken from the current directory; an absolute one
    /// is saved under its file name.
    pub fn savepath(&self, path: impl AsRef<Path>, scope: ScopeLevel) -> StagingResult<PathBuf> {
        let path = path.as_ref();
        let scope_dir = self.scope_to_path(scope, true)?;
        let dest = if path.is_absolute() {
            scope_dir.join(path.file_name().unwrap_or(path.as_os_str()))
        } else {
            scope_dir.join(path)
        };

        self.observer.saving_path(path, &scope_dir);
        copy_preserving(path, &dest).map_err(|e| StagingError::io(path, e))?;
        Ok(dest)
    }

    pub(crate) fn save_tree(
        &self,
        root: &Path,
        scope: ScopeLevel,
        exclusions: &Exclusions,
        show_progress: bool,
    ) -> StagingResult<Vec<PathBuf>> {
        let report = FileScanner::new(root)
            .with_exclusions(exclusions)
            .relative(true)
            .scan()?;
        self.observer
            .files_filtered(report.files.len(), report.considered);
        self.observer.saving_outputs(report.files.len(), root);

        let scope_dir = self.scope_to_path(scope, true)?;
        let mut progress = sink_for(show_progress);
        let total: u64 = report
            .files
            .iter()
            .filter_map(|rel| fs::metadata(root.join(rel)).ok())
            .map(|meta| meta.len())
            .sum();
        progress.start("saving outputs", Some(total));

        let mut saved = Vec::with_capacity(report.files.len());
        for relpath in &report.files {
            self.observer.saving_path(relpath, &scope_dir);
            let dest = scope_dir.join(relpath);
            let copied = copy_preserving(&root.join(relpath), &dest)
                .map_err(|e| StagingError::io(&dest, e))?;
            progress.advance(copied);
            saved.push(dest);
        }
        progress.finish();

        Ok(saved)
    }
}

impl fmt::Display for DataDirManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Manager of test data under {}", self.datapath.display())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::observer::SilentObserver;
    use crate::errors::LookupError;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn manager(temp_dir: &TempDir, identity: TestIdentity) -> DataDirManager {
        DataDirManager::new(
            identity,
            temp_dir.path(),
            temp_dir.path().join("scratch"),
        )
        .unwrap()
        .with_observer(Arc::new(SilentObserver))
    }

    #[test]
    fn test_display() {
        let temp_dir = TempDir::new().unwrap();
        let mgr = manager(&temp_dir, TestIdentity::new("tests.module_test"));
        assert_eq!(
            mgr.to_string(),
            format!("Manager of test data under {}", temp_dir.path().join("data").display())
        );
    }

    #[test]
    fn test_scope_to_path() {
        let temp_dir = TempDir::new().unwrap();
        let identity = TestIdentity::new("tests.module_test").with_function("test_f");
        let mgr = manager(&temp_dir, identity);
        let data = temp_dir.path().join("data");

        let function_dir = mgr.scope_to_path(ScopeLevel::Function, false).unwrap();
        assert_eq!(function_dir, data.join("module_test").join("test_f"));
        assert!(!function_dir.exists());

        let module_dir = mgr.scope_to_path(ScopeLevel::Module, true).unwrap();
        assert_eq!(module_dir, data.join("module_test"));
        assert!(module_dir.is_dir());

        assert_eq!(mgr.scope_to_path(ScopeLevel::Global, false).unwrap(), data);

        match mgr.scope_to_path(ScopeLevel::Class, false) {
            Err(ScopeError::NotInRequest { level }) => assert_eq!(level, ScopeLevel::Class),
            other => panic!("Expected NotInRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_get_and_locate() {
        let temp_dir = TempDir::new().unwrap();
        let identity = TestIdentity::new("tests.module_test").with_function("test_f");
        let mgr = manager(&temp_dir, identity);
        let data = temp_dir.path().join("data");

        write(&data.join("data1.txt"), "global");
        write(&data.join("module_test/test_f/data1.txt"), "function");

        let found = mgr.locate("data1.txt").unwrap();
        assert_eq!(found.level, ScopeLevel::Function);
        assert_eq!(found.chain, "request");
        assert_eq!(
            fs::read_to_string(mgr.get("data1.txt").unwrap()).unwrap(),
            "function"
        );

        match mgr.get("missing.txt") {
            Err(LookupError::NotFound { searched, .. }) => {
                assert_eq!(searched, vec!["request".to_string()])
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_add_scope_is_searched_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut mgr = manager(
            &temp_dir,
            TestIdentity::new("tests.module_test").with_function("test_f"),
        );
        let data = temp_dir.path().join("data");

        write(&data.join("module_test/test_f/shared.txt"), "mine");
        write(&data.join("other_test/test_g/shared.txt"), "theirs");
        write(&data.join("other_test/only_theirs.txt"), "module of other");

        let other = TestIdentity::new("tests.other_test").with_function("test_g");
        mgr.add_scope("producer", &other);

        let found = mgr.locate("shared.txt").unwrap();
        assert_eq!(found.chain, "producer");
        assert_eq!(fs::read_to_string(found.path).unwrap(), "theirs");
        assert_eq!(
            fs::read_to_string(mgr.get("only_theirs.txt").unwrap()).unwrap(),
            "module of other"
        );
        assert_eq!(
            mgr.registry().search_order(),
            vec!["producer".to_string(), "request".to_string()]
        );
    }

    #[test]
    fn test_paths_from_scope() {
        let temp_dir = TempDir::new().unwrap();
        let mgr = manager(&temp_dir, TestIdentity::new("tests.module_test"));
        let data = temp_dir.path().join("data");

        let producer = TestIdentity::new("tests.module_test").with_function("test_producer");
        assert!(mgr
            .paths_from_scope(&producer, &Exclusions::new())
            .unwrap()
            .is_empty());

        write(&data.join("module_test/test_producer/out.csv"), "1,2");
        write(&data.join("module_test/test_producer/run.log"), "log");
        write(&data.join("module_test/test_producer/sub/nested.txt"), "n");

        let paths: HashSet<PathBuf> = mgr
            .paths_from_scope(&producer, &Exclusions::new().with_patterns(["*.log"]))
            .unwrap()
            .into_iter()
            .collect();
        let expected: HashSet<PathBuf> = [
            PathBuf::from("out.csv"),
            PathBuf::from("sub").join("nested.txt"),
        ]
        .into_iter()
        .collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_relative_test_dir_is_made_absolute() {
        let temp_dir = TempDir::new().unwrap();
        let mgr = DataDirManager::new(
            TestIdentity::new("pkg.mod"),
            "tests",
            temp_dir.path(),
        )
        .unwrap();
        assert!(mgr.datapath().is_absolute());
        assert!(mgr.datapath().ends_with("tests/data"));
        assert_eq!(mgr.tmp_path(), temp_dir.path());
    }

    #[test]
    fn test_custom_global_subdir() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = DataDirConfig::default();
        config.datadir.global_subdir = "fixtures".to_string();
        config.datadir.strip_package_prefix = false;

        let mgr = DataDirManager::with_config(
            TestIdentity::new("tests.module_test"),
            temp_dir.path(),
            temp_dir.path().join("scratch"),
            &config,
        )
        .unwrap();

        assert_eq!(
            mgr.scope_to_path(ScopeLevel::Module, false).unwrap(),
            temp_dir.path().join("fixtures").join("tests.module_test")
        );
    }
}
