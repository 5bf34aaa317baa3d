//! Parameters of one download call

use url::Url;

use crate::app::scope::ScopeLevel;
use crate::constants::files;
use crate::errors::{ConfigError, DownloadError, DownloadResult};

/// What to fetch, where to cache it and how to check it
///
/// The base URL and file list are optional so that a request assembled
/// from partial configuration fails with a [`ConfigError`] before any I/O.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Directory URL the files are published under
    pub base_url: Option<String>,
    /// File names relative to `base_url` and to the scope directory
    pub files: Option<Vec<String>>,
    /// Scope level the files are cached at
    pub scope: ScopeLevel,
    /// Fetch `<name>.gz` and decompress it to `<name>`
    pub gunzip: bool,
    /// Verify against a published `<remote name>.md5` file
    pub verify_md5: bool,
    /// Draw a transfer bar while downloading
    pub show_progress: bool,
}

impl DownloadRequest {
    /// Request for `files` under `base_url`, cached at module scope
    pub fn new<I, S>(base_url: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().with_url(base_url).with_files(files)
    }

    /// Set the base URL
    pub fn with_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the file list
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    /// Set the target scope level
    pub fn scope(mut self, scope: ScopeLevel) -> Self {
        self.scope = scope;
        self
    }

    /// Enable or disable gzip decompression
    pub fn gunzip(mut self, gunzip: bool) -> Self {
        self.gunzip = gunzip;
        self
    }

    /// Enable or disable MD5 verification
    pub fn verify_md5(mut self, verify_md5: bool) -> Self {
        self.verify_md5 = verify_md5;
        self
    }

    /// Enable or disable the progress bar
    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Check required parameters and parse the base URL
    ///
    /// The returned URL always ends in `/` so file names join beneath it.
    pub fn validate(&self) -> DownloadResult<(Url, &[String])> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| ConfigError::missing("download_url"))?;
        let files = self
            .files
            .as_deref()
            .ok_or_else(|| ConfigError::missing("iterable of files"))?;

        let mut normalized = base_url.to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let url = Url::parse(&normalized).map_err(|e| DownloadError::InvalidUrl {
            url: base_url.to_string(),
            error: e.to_string(),
        })?;

        Ok((url, files))
    }

    /// Name of the remote data file for `filename`
    pub fn remote_name(&self, filename: &str) -> String {
        if self.gunzip {
            format!("{}{}", filename, files::GZIP_SUFFIX)
        } else {
            filename.to_string()
        }
    }

    /// Name of the remote checksum file for `filename`
    pub fn checksum_name(&self, filename: &str) -> String {
        format!("{}{}", self.remote_name(filename), files::MD5_SUFFIX)
    }
}
