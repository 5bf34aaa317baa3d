//! Data directory manager CLI application
//!
//! Command-line interface for finding, listing and downloading test fixtures
//! in a scope-aware data directory.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library (module is public but not re-exported)
use datadir_mgr::cli::{handle_config, handle_download, handle_find, handle_paths, Cli, Commands};
use datadir_mgr::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error ({}): {}", e.category(), e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(&cli);

    info!("datadir_mgr v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Find(args) => handle_find(&cli.global, args),
        Commands::Paths(args) => handle_paths(&cli.global, args),
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(&cli.global, args).await
        }
        Commands::Config(args) => handle_config(&cli.global, args),
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("datadir_mgr={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
