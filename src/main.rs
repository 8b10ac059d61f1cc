//! hoard - content-addressed build output cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use hoard::cleanup::{BuildRole, PARENT_BUILD_ENV};
use hoard::cli::{Cli, Commands};
use hoard::config::ConfigManager;
use hoard::error::HoardResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> HoardResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;
    if let Some(dir) = cli.cache_dir.clone() {
        config.cache.dir = Some(dir);
    }

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("hoard=warn"),
        1 => EnvFilter::new("hoard=info"),
        _ => EnvFilter::new("hoard=debug"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }
    debug!("Using cache store {}", config.cache.store_dir().display());

    // Decided once for the whole process
    let parent_marker = std::env::var(PARENT_BUILD_ENV).ok();

    match cli.command {
        Commands::Put(args) => hoard::cli::commands::put(args, &config),
        Commands::Get(args) => hoard::cli::commands::get(args, &config),
        Commands::Invalidate(args) => hoard::cli::commands::invalidate(args, &config),
        Commands::Status(args) => hoard::cli::commands::status(args, &config),
        Commands::Gc(args) => {
            let role = BuildRole::detect(args.role.map(Into::into), parent_marker.as_deref());
            hoard::cli::commands::gc(args, &config, role)
        }
        Commands::Config(args) => {
            hoard::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
