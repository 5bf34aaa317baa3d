//! Command-line interface components
//!
//! This module contains CLI-specific code for the data directory manager,
//! including argument parsing and command handlers.

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, DownloadArgs, ExtraScope, FindArgs, GlobalArgs,
    IdentityArgs, PathsArgs,
};
pub use commands::{handle_config, handle_download, handle_find, handle_paths};
