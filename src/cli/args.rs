//! Command-line argument parsing for the data directory manager
//!
//! This module defines the CLI structure using clap derive macros. Every
//! command names a test identity with `--module`, `--class` and
//! `--function`, which resolves to the same scope directories a test would
//! use.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::app::{Exclusions, ScopeLevel, TestIdentity};

/// Data directory manager - scope-aware test fixture cache
#[derive(Parser, Debug)]
#[command(
    name = "datadir_mgr",
    version,
    about = "Find, list and download test fixtures in a scoped data directory",
    long_about = "Resolves test data files against a nested function/class/module/global directory
hierarchy, and downloads remote fixtures into it with optional MD5 verification."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the tests (the cache is its data subdirectory)
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub test_dir: PathBuf,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the path a test would get for a data file
    Find(FindArgs),

    /// List files saved at the most specific scope of a test
    Paths(PathsArgs),

    /// Download remote files into a test's scope directory
    Download(DownloadArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Test identity shared by all commands
#[derive(Args, Debug, Clone)]
pub struct IdentityArgs {
    /// Dotted module name, e.g. "tests.io_test"
    #[arg(short, long)]
    pub module: String,

    /// Class (test group) name
    #[arg(long)]
    pub class: Option<String>,

    /// Test function name
    #[arg(short, long)]
    pub function: Option<String>,
}

impl IdentityArgs {
    /// Identity named by these arguments
    pub fn identity(&self) -> TestIdentity {
        let mut identity = TestIdentity::new(self.module.clone());
        if let Some(class) = &self.class {
            identity = identity.with_class(class.clone());
        }
        if let Some(function) = &self.function {
            identity = identity.with_function(function.clone());
        }
        identity
    }
}

/// Extra scope chain given as `LABEL=MODULE[[:CLASS]:FUNCTION]`
///
/// With two segments after the module the middle one is the class; with one
/// it is the function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraScope {
    pub label: String,
    pub identity: TestIdentity,
}

impl FromStr for ExtraScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, scope) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected LABEL=MODULE[[:CLASS]:FUNCTION], got '{}'", s))?;
        if label.is_empty() {
            return Err(format!("Missing label in '{}'", s));
        }

        let parts: Vec<&str> = scope.split(':').collect();
        let identity = match parts.as_slice() {
            [module] if !module.is_empty() => TestIdentity::new(*module),
            [module, function] if !module.is_empty() => {
                TestIdentity::new(*module).with_function(*function)
            }
            [module, class, function] if !module.is_empty() => TestIdentity::new(*module)
                .with_class(*class)
                .with_function(*function),
            _ => return Err(format!("Invalid scope '{}'", scope)),
        };

        Ok(Self {
            label: label.to_string(),
            identity,
        })
    }
}

/// Arguments for the find command
#[derive(Args, Debug, Clone)]
pub struct FindArgs {
    /// Path relative to the scope directories
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Additional scope chain searched before the test's own
    #[arg(long, value_name = "LABEL=MODULE[[:CLASS]:FUNCTION]")]
    pub extra: Vec<ExtraScope>,
}

/// Arguments for the paths command
#[derive(Args, Debug, Clone)]
pub struct PathsArgs {
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Relative path to leave out (repeatable)
    #[arg(long, value_name = "PATH")]
    pub exclude: Vec<PathBuf>,

    /// Glob pattern to leave out, e.g. "*.log" (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude_pattern: Vec<String>,

    /// Print a JSON array instead of one path per line
    #[arg(long)]
    pub json: bool,
}

impl PathsArgs {
    /// Exclusions named by these arguments
    pub fn exclusions(&self) -> Exclusions {
        Exclusions::new()
            .with_paths(self.exclude.iter().cloned())
            .with_patterns(self.exclude_pattern.iter().cloned())
    }
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Directory URL the files are published under
    #[arg(value_name = "URL")]
    pub url: String,

    /// File names to fetch
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<String>,

    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Scope level to cache at (defaults to the configured scope)
    #[arg(short, long)]
    pub scope: Option<ScopeLevel>,

    /// Fetch FILE.gz and decompress it
    #[arg(long)]
    pub gunzip: bool,

    /// Verify against the published .md5 file
    #[arg(long)]
    pub md5: bool,

    /// Show a transfer progress bar
    #[arg(long)]
    pub progress: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Where to write it (defaults to the per-user config file)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
