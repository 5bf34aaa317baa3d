//! Integration tests for downloads through the data directory manager
//!
//! A local httpmock server publishes data files, gzip variants and `.md5`
//! companions; the manager caches them into scope directories.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flate2::write::GzEncoder;
use flate2::Compression;
use httpmock::prelude::*;
use tempfile::TempDir;

use datadir_mgr::app::{
    DataDirManager, DataDirObserver, DownloadRequest, Md5Hash, ScopeLevel, TestIdentity,
    TransferProgress,
};
use datadir_mgr::errors::{AppError, ConfigError, DownloadError, ScopeError};

const LICENSE: &str = "Permission is hereby granted, free of charge, to any person\n";

#[derive(Debug, Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl DataDirObserver for Recorder {
    fn download_cached(&self, path: &Path) {
        self.push(format!("cached {}", file_name(path)));
    }

    fn download_started(&self, url: &str, checked: bool) {
        self.push(format!("started {} checked={}", url, checked));
    }

    fn download_finished(&self, path: &Path, gunzipped: bool, checked: bool) {
        self.push(format!(
            "finished {} gunzipped={} checked={}",
            file_name(path),
            gunzipped,
            checked
        ));
    }
}

#[derive(Debug, Default)]
struct CountingProgress {
    started: Vec<(String, Option<u64>)>,
    bytes: u64,
    finished: usize,
}

impl TransferProgress for CountingProgress {
    fn start(&mut self, label: &str, total: Option<u64>) {
        self.started.push((label.to_string(), total));
    }

    fn advance(&mut self, bytes: u64) {
        self.bytes += bytes;
    }

    fn finish(&mut self) {
        self.finished += 1;
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn manager(temp_dir: &TempDir, identity: TestIdentity) -> DataDirManager {
    DataDirManager::new(
        identity,
        temp_dir.path().join("tests"),
        temp_dir.path().join("scratch"),
    )
    .unwrap()
}

fn global(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("tests").join("data")
}

#[tokio::test]
async fn test_download_then_lookup_at_function_scope() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/X");
            then.status(200).body("known content");
        })
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mgr = manager(&temp_dir, TestIdentity::new("m").with_function("f"));

    let request = DownloadRequest::new(server.url("/files"), ["X"]).scope(ScopeLevel::Function);
    let report = mgr.download(&request).await.unwrap();

    let expected_path = global(&temp_dir).join("m").join("f").join("X");
    assert_eq!(report.downloaded, vec![expected_path.clone()]);

    let found = mgr.get("X").unwrap();
    assert_eq!(found, expected_path);
    assert_eq!(fs::read_to_string(found).unwrap(), "known content");
}

#[tokio::test]
async fn test_second_download_is_a_no_op() {
    let server = MockServer::start_async().await;
    let data = server
        .mock_async(|when, then| {
            when.method(GET).path("/LICENSE");
            then.status(200).body(LICENSE);
        })
        .await;

    let temp_dir = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let mgr = manager(&temp_dir, TestIdentity::new("tests.dl_test"))
        .with_observer(recorder.clone());

    let request = DownloadRequest::new(server.base_url(), ["LICENSE"]);
    let first = mgr.download(&request).await.unwrap();
    let second = mgr.download(&request).await.unwrap();

    data.assert_hits_async(1).await;
    assert_eq!(first.downloaded.len(), 1);
    assert!(second.downloaded.is_empty());
    assert_eq!(second.cached, first.downloaded);

    let events = recorder.events();
    assert_eq!(events.len(), 3);
    assert!(events[0].starts_with("started "));
    assert!(events[0].ends_with("/LICENSE checked=false"));
    assert_eq!(events[1], "finished LICENSE gunzipped=false checked=false");
    assert_eq!(events[2], "cached LICENSE");
}

#[tokio::test]
async fn test_gunzip_with_md5_round_trip() {
    let server = MockServer::start_async().await;
    let compressed = gzip(LICENSE.as_bytes());
    let digest = Md5Hash::compute(&compressed).to_hex();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/dltest/LICENSE.gz");
            then.status(200).body(compressed.clone());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/dltest/LICENSE.gz.md5");
            then.status(200).body(format!("{}  LICENSE.gz\n", digest));
        })
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mgr = manager(&temp_dir, TestIdentity::new("tests.dl_test").with_function("test_gz"));

    let request = DownloadRequest::new(server.url("/dltest/"), ["LICENSE"])
        .scope(ScopeLevel::Global)
        .gunzip(true)
        .verify_md5(true);
    let mut progress = CountingProgress::default();
    mgr.download_with_progress(&request, &mut progress)
        .await
        .unwrap();

    let cached = global(&temp_dir).join("LICENSE");
    assert_eq!(fs::read_to_string(&cached).unwrap(), LICENSE);
    assert!(!global(&temp_dir).join("LICENSE.gz.tmp").exists());
    assert!(!global(&temp_dir).join("LICENSE.gz.md5").exists());

    assert_eq!(progress.started.len(), 1);
    assert_eq!(progress.started[0].0, "LICENSE");
    assert_eq!(progress.bytes, compressed.len() as u64);
    assert_eq!(progress.finished, 1);

    // Found from the function scope's chain via the global tier
    assert_eq!(mgr.get("LICENSE").unwrap(), cached);
}

#[tokio::test]
async fn test_wrong_checksum_is_integrity_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/LICENSE");
            then.status(200).body(LICENSE);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/LICENSE.md5");
            then.status(200).body("0123456789abcdef0123456789abcdef  LICENSE\n");
        })
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mgr = manager(&temp_dir, TestIdentity::new("tests.dl_test"));

    let request = DownloadRequest::new(server.base_url(), ["LICENSE"]).verify_md5(true);
    let err: AppError = mgr.download(&request).await.unwrap_err().into();

    assert!(err.is_integrity_failure());
    assert_eq!(err.category(), "integrity");
    assert!(err.to_string().contains("expected 0123456789abcdef0123456789abcdef"));

    let module_dir = global(&temp_dir).join("dl_test");
    assert!(!module_dir.join("LICENSE").exists());
    assert!(module_dir.join("LICENSE.tmp").exists());
    assert!(mgr.get("LICENSE").is_err());
}

#[tokio::test]
async fn test_non_hex_checksum_file_is_integrity_failure() {
    let server = MockServer::start_async().await;
    let data = server
        .mock_async(|when, then| {
            when.method(GET).path("/LICENSE");
            then.status(200).body(LICENSE);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/LICENSE.md5");
            then.status(200).body("wrong  LICENSE\n");
        })
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mgr = manager(&temp_dir, TestIdentity::new("tests.dl_test"));

    let request = DownloadRequest::new(server.base_url(), ["LICENSE"]).verify_md5(true);
    let err: AppError = mgr.download(&request).await.unwrap_err().into();

    data.assert_hits_async(1).await;
    assert!(err.is_integrity_failure());
    assert_eq!(err.category(), "integrity");
    assert!(mgr.get("LICENSE").is_err());
}

#[tokio::test]
async fn test_missing_parameters_fail_before_io() {
    let temp_dir = TempDir::new().unwrap();
    let mgr = manager(&temp_dir, TestIdentity::new("tests.dl_test"));

    let no_url = DownloadRequest::default().with_files(["LICENSE"]);
    match mgr.download(&no_url).await {
        Err(DownloadError::Config(ConfigError::MissingField { field })) => {
            assert_eq!(field, "download_url")
        }
        other => panic!("Expected missing download_url, got {:?}", other),
    }

    let no_files = DownloadRequest::default().with_url("http://127.0.0.1:9/");
    let err: AppError = mgr.download(&no_files).await.unwrap_err().into();
    assert_eq!(err.category(), "config");

    assert!(!global(&temp_dir).exists());
}

#[tokio::test]
async fn test_scope_absent_from_request() {
    let temp_dir = TempDir::new().unwrap();
    let mgr = manager(&temp_dir, TestIdentity::new("tests.dl_test"));

    let request = DownloadRequest::new("http://127.0.0.1:9/", ["X"]).scope(ScopeLevel::Function);
    match mgr.download(&request).await {
        Err(DownloadError::Scope(ScopeError::NotInRequest { level })) => {
            assert_eq!(level, ScopeLevel::Function)
        }
        other => panic!("Expected NotInRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_first_failure_aborts_remaining_files() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET).path("/a");
            then.status(200).body("a");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/b");
            then.status(500);
        })
        .await;
    let third = server
        .mock_async(|when, then| {
            when.method(GET).path("/c");
            then.status(200).body("c");
        })
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mgr = manager(&temp_dir, TestIdentity::new("tests.dl_test"));

    let request = DownloadRequest::new(server.base_url(), ["a", "b", "c"]);
    let err = mgr.download(&request).await.unwrap_err();
    assert!(matches!(err, DownloadError::Http(_)));

    first.assert_hits_async(1).await;
    third.assert_hits_async(0).await;
    let module_dir = global(&temp_dir).join("dl_test");
    assert!(module_dir.join("a").exists());
    assert!(!module_dir.join("c").exists());
}
