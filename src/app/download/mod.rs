//! Remote file downloads into a scope directory
//!
//! Each requested file is streamed to `<remote name>.tmp` beside its final
//! location while an MD5 digest is computed over the bytes as they arrive.
//! The temp file only becomes the cached file once the digest (if requested)
//! matches the published checksum. A file that already exists at its final
//! path is never fetched again.
//!
//! There are no retries: the first failing file aborts the batch.

pub mod config;
pub mod request;

pub use config::ClientConfig;
pub use request::DownloadRequest;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use futures::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::hash::{checksum_token, HashTracker, Md5Hash};
use crate::app::observer::DataDirObserver;
use crate::app::progress::TransferProgress;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// Outcome of a download call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Final paths of files fetched by this call
    pub downloaded: Vec<PathBuf>,
    /// Final paths that were already present and skipped
    pub cached: Vec<PathBuf>,
}

impl DownloadReport {
    /// Every final path, fetched first then cached
    pub fn all_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.downloaded.iter().chain(self.cached.iter())
    }
}

/// Streams remote files into a local directory
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Downloader with a client built from `config`
    pub fn new(config: &ClientConfig) -> DownloadResult<Self> {
        Ok(Self {
            client: config.build_http_client()?,
        })
    }

    /// Downloader reusing an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch every file of `request` into `target_dir`
    ///
    /// `target_dir` is the already-resolved scope directory; it is created
    /// if needed.
    pub async fn fetch(
        &self,
        request: &DownloadRequest,
        target_dir: &Path,
        observer: &dyn DataDirObserver,
        progress: &mut dyn TransferProgress,
    ) -> DownloadResult<DownloadReport> {
        let (base_url, filenames) = request.validate()?;
        let mut report = DownloadReport::default();

        for filename in filenames {
            let final_path = target_dir.join(filename);
            if final_path.exists() {
                observer.download_cached(&final_path);
                report.cached.push(final_path);
                continue;
            }

            self.fetch_one(request, &base_url, filename, target_dir, observer, progress)
                .await?;
            report.downloaded.push(final_path);
        }

        Ok(report)
    }

    async fn fetch_one(
        &self,
        request: &DownloadRequest,
        base_url: &Url,
        filename: &str,
        target_dir: &Path,
        observer: &dyn DataDirObserver,
        progress: &mut dyn TransferProgress,
    ) -> DownloadResult<()> {
        let final_path = target_dir.join(filename);
        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let expected = if request.verify_md5 {
            let checksum_name = request.checksum_name(filename);
            let checksum_url = join_url(base_url, &checksum_name)?;
            Some(
                self.fetch_checksum(&checksum_url, &target_dir.join(&checksum_name))
                    .await?,
            )
        } else {
            None
        };

        let remote_name = request.remote_name(filename);
        let url = join_url(base_url, &remote_name)?;
        let temp_path = target_dir.join(format!("{}{}", remote_name, files::TEMP_FILE_SUFFIX));

        observer.download_started(url.as_str(), expected.is_some());
        let actual = self
            .fetch_to_file(&url, &temp_path, filename, progress)
            .await?;

        if let Some(expected) = expected {
            if !actual.matches_hex(&expected) {
                tracing::warn!(
                    "Checksum mismatch for {}, keeping {}",
                    filename,
                    temp_path.display()
                );
                return Err(DownloadError::HashMismatch {
                    file: filename.to_string(),
                    expected,
                    actual: actual.to_hex(),
                });
            }
        }

        if request.gunzip {
            gunzip_to(temp_path, final_path.clone()).await?;
        } else {
            tokio::fs::rename(&temp_path, &final_path).await?;
        }

        observer.download_finished(&final_path, request.gunzip, request.verify_md5);
        Ok(())
    }

    /// Read the expected digest text from a checksum file, fetching it if absent
    ///
    /// The checksum file is removed once read. The text is only compared
    /// after the data file arrives, so a malformed checksum is reported as a
    /// mismatch.
    async fn fetch_checksum(&self, url: &Url, path: &Path) -> DownloadResult<String> {
        if !path.exists() {
            let body = self
                .client
                .get(url.clone())
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;
            tokio::fs::write(path, &body).await?;
        }

        let content = tokio::fs::read_to_string(path).await?;
        tokio::fs::remove_file(path).await?;

        Ok(checksum_token(&content).to_string())
    }

    /// Stream `url` into `dest`, returning the MD5 of the bytes written
    pub async fn fetch_to_file(
        &self,
        url: &Url,
        dest: &Path,
        label: &str,
        progress: &mut dyn TransferProgress,
    ) -> DownloadResult<Md5Hash> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        progress.start(label, response.content_length());

        let mut file = File::create(dest).await?;
        let mut tracker = HashTracker::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            tracker.update(&chunk);
            file.write_all(&chunk).await?;
            progress.advance(chunk.len() as u64);
        }

        file.flush().await?;
        progress.finish();

        Ok(tracker.finish())
    }
}

/// Append `name` to the directory URL `base_url`
///
/// The name is taken as a path below the base, never as a URL of its own.
fn join_url(base_url: &Url, name: &str) -> DownloadResult<Url> {
    let url = format!("{}{}", base_url, name.trim_start_matches('/'));
    Url::parse(&url).map_err(|e| DownloadError::InvalidUrl {
        url,
        error: e.to_string(),
    })
}

/// Decompress `temp_path` into `final_path`, then remove `temp_path`
///
/// A partially written `final_path` is removed on failure.
async fn gunzip_to(temp_path: PathBuf, final_path: PathBuf) -> DownloadResult<()> {
    tokio::task::spawn_blocking(move || -> DownloadResult<()> {
        let result = fs::File::open(&temp_path).and_then(|input| {
            let mut decoder = MultiGzDecoder::new(io::BufReader::new(input));
            let mut output = fs::File::create(&final_path)?;
            io::copy(&mut decoder, &mut output).map(|_| ())
        });

        if let Err(source) = result {
            let _ = fs::remove_file(&final_path);
            return Err(DownloadError::Decompress {
                path: temp_path,
                source,
            });
        }

        fs::remove_file(&temp_path)?;
        Ok(())
    })
    .await
    .map_err(|e| DownloadError::Io(io::Error::new(io::ErrorKind::Other, e)))?
}
