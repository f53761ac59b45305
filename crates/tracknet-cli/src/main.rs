//! tracknet CLI - Command-line interface for tracknet
//!
//! Provides commands for:
//! - Running a playlist sync against the previous snapshot
//! - Fetching a playlist without modifying it
//! - Promoting tracks from one playlist to another
//! - Provisioning keyring credentials
//! - Inspecting configuration

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tracknet_core::config::{Config, LoggingConfig};

mod commands;
mod output;

use commands::{
    config::ConfigCommand, credentials::CredentialsCommand, fetch::FetchCommand,
    promote::PromoteCommand, sync::SyncCommand, CommandContext,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "tracknet", version, about = "Keeps a Spotify playlist fresh")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch, reconcile and prune a playlist
    Sync(SyncCommand),
    /// Fetch a playlist and print its tracks
    Fetch(FetchCommand),
    /// Move tracks from one playlist to another
    Promote(PromoteCommand),
    /// Manage credentials stored in the system keyring
    #[command(subcommand)]
    Credentials(CredentialsCommand),
    /// View and check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Filter directive: `RUST_LOG` wins, then `-v`, then the configured level
fn env_filter(verbose: u8, logging: &LoggingConfig) -> EnvFilter {
    let fallback = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

fn init_tracing(verbose: u8, logging: &LoggingConfig) {
    let filter = env_filter(verbose, logging);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().flatten_event(true).init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<(Config, PathBuf)> {
    match path {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            Ok((config, path.clone()))
        }
        None => {
            let path = Config::default_path();
            Ok((Config::load_or_default(&path), path))
        }
    }
}

async fn run(cli: Cli, format: OutputFormat) -> Result<()> {
    let (config, config_path) = load_config(cli.config.as_ref())?;
    init_tracing(cli.verbose, &config.logging);

    let ctx = CommandContext {
        config,
        config_path,
        format,
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Fetch(cmd) => cmd.execute(&ctx).await,
        Commands::Promote(cmd) => cmd.execute(&ctx).await,
        Commands::Credentials(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match run(cli, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            get_formatter(matches!(format, OutputFormat::Json)).error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
