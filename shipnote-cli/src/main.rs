//! Shipnote CLI - release notifications from pull request events
//!
//! Runs inside a GitHub Actions job triggered by `pull_request` events.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shipnote_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ExtractArgs, NotifyArgs};

/// Shipnote: task status updates and release notes for pull requests
#[derive(Parser, Debug)]
#[command(name = "shipnote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a config file (defaults to ~/.config/shipnote/config.toml)
    #[arg(long, global = true, env = "SHIPNOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Slack channel for release notes (overrides config and env)
    #[arg(long, global = true)]
    slack_channel: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Update task statuses and post release notes for a PR event
    #[command(visible_alias = "n")]
    Notify(NotifyArgs),

    /// Print the task references and feature flags found in a description
    Extract(ExtractArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = Config::load_with_overrides(cli.config.as_deref(), cli.slack_channel.clone())?;

    if cli.verbose {
        tracing::debug!(
            page_size = config.github.page_size,
            channel = ?config.slack.channel_id,
            timeout = ?config.http.timeout,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("shipnote {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Notify(args)) => {
            if let Err(e) = args.execute(&config).await {
                tracing::error!(error = %e, "Release pipeline failed");
                return Err(e);
            }
        }
        Some(Commands::Extract(args)) => {
            args.execute()?;
        }
        Some(Commands::Config) => {
            print_config(&config, cli.config.as_deref());
        }
        None => {
            println!("Shipnote - task status updates and release notes for pull requests");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn print_config(config: &Config, explicit_path: Option<&std::path::Path>) {
    println!("Shipnote Configuration");
    println!("======================");
    println!();
    println!("GitHub:");
    println!("  page_size: {}", config.github.page_size);
    println!("Tracker:");
    println!("  base_url: {}", config.tracker.base_url);
    println!("  status_field: {}", config.tracker.status_field);
    println!(
        "  review / staging / production codes: {} / {} / {}",
        config.tracker.status_codes.under_review,
        config.tracker.status_codes.in_staging,
        config.tracker.status_codes.in_production
    );
    println!("Slack:");
    println!(
        "  channel_id: {}",
        config.slack.channel_id.as_deref().unwrap_or("(none - notes disabled)")
    );
    println!("  thread_key: {}", config.slack.thread_key);
    println!("Branches:");
    println!("  review: {}", config.branches.review.join(", "));
    println!("  staging: {}", config.branches.staging.join(", "));
    println!("  production: {}", config.branches.production.join(", "));
    println!("Policy:");
    println!("  strict_status_updates: {}", config.policy.strict_status_updates);
    println!("  strict_child_fetch: {}", config.policy.strict_child_fetch);
    println!();

    let path = explicit_path
        .map(std::path::Path::to_path_buf)
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}
