//! Command handlers for the data directory manager CLI
//!
//! Each handler builds a [`DataDirManager`] for the identity given on the
//! command line and runs one operation against it, printing results to
//! stdout.

use std::time::Instant;

use tracing::info;

use crate::app::{DataDirManager, DownloadRequest, TestIdentity};
use crate::cli::{ConfigAction, ConfigArgs, DownloadArgs, FindArgs, GlobalArgs, PathsArgs};
use crate::config::DataDirConfig;
use crate::errors::{AppError, Result};

/// Handle the find command
pub fn handle_find(global: &GlobalArgs, args: FindArgs) -> Result<()> {
    let config = DataDirConfig::load(global.config.clone())?;
    let mut manager = build_manager(global, args.identity.identity(), &config)?;

    for extra in &args.extra {
        manager.add_scope(extra.label.clone(), &extra.identity);
    }

    let found = manager.locate(&args.path)?;
    info!(
        "Found {} in chain {} at {} scope",
        args.path.display(),
        found.chain,
        found.level
    );
    println!("{}", found.path.display());
    Ok(())
}

/// Handle the paths command
pub fn handle_paths(global: &GlobalArgs, args: PathsArgs) -> Result<()> {
    let config = DataDirConfig::load(global.config.clone())?;
    let identity = args.identity.identity();
    let manager = build_manager(global, identity.clone(), &config)?;

    let paths = manager.paths_from_scope(&identity, &args.exclusions())?;

    if args.json {
        let rendered: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        let json = serde_json::to_string_pretty(&rendered)
            .map_err(|e| AppError::generic(format!("Failed to render JSON: {}", e)))?;
        println!("{}", json);
    } else {
        for path in &paths {
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Handle the download command
pub async fn handle_download(global: &GlobalArgs, args: DownloadArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = DataDirConfig::load(global.config.clone())?;
    let manager = build_manager(global, args.identity.identity(), &config)?;

    let request = DownloadRequest::new(args.url, args.files)
        .scope(args.scope.unwrap_or(manager.default_scope()))
        .gunzip(args.gunzip)
        .verify_md5(args.md5)
        .show_progress(args.progress);

    let report = manager.download(&request).await?;
    info!(
        "Downloaded {} files ({} already cached) in {:?}",
        report.downloaded.len(),
        report.cached.len(),
        start_time.elapsed()
    );

    for path in report.all_paths() {
        println!("{}", path.display());
    }
    Ok(())
}

/// Handle configuration commands
pub fn handle_config(global: &GlobalArgs, args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { path } => {
            let path = match path {
                Some(path) => path,
                None => DataDirConfig::default_config_path()
                    .ok_or_else(|| AppError::generic("Could not determine user config directory"))?,
            };
            if DataDirConfig::write_default(&path)? {
                println!("Created default configuration file: {}", path.display());
            } else {
                println!("Configuration file already exists: {}", path.display());
            }
        }
        ConfigAction::Show => {
            let config = DataDirConfig::load(global.config.clone())?;
            print!("{}", config.to_toml());
        }
    }
    Ok(())
}

fn build_manager(
    global: &GlobalArgs,
    identity: TestIdentity,
    config: &DataDirConfig,
) -> Result<DataDirManager> {
    let tmp_path = std::env::temp_dir().join(crate::constants::config::APP_DIR_NAME);
    DataDirManager::with_config(identity, &global.test_dir, tmp_path, config)
}
