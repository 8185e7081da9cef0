//! Command-line interface.
//!
//! The CLI is the control panel: it starts the bot loop, triggers update
//! checks and installs, and exposes the settings. Global `--verbose` and
//! `--quiet` flags steer the tracing filter; `RUST_LOG` wins when set.

mod config;
mod run;
mod upgrade;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::config::SettingsStore;

/// Fishing bot control panel with self-updating from GitHub releases.
#[derive(Parser)]
#[command(name = "reelbot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the fishing loop.
    Run(run::RunArgs),
    /// Check whether a newer release is published.
    Check(upgrade::CheckArgs),
    /// Download and install the latest release.
    Upgrade(upgrade::UpgradeArgs),
    /// Show version and update-state information.
    Status,
    /// Inspect or change settings.
    Config(config::ConfigArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        init_tracing(self.verbose, self.quiet);

        match self.command {
            Commands::Run(args) => run::execute(args).await,
            Commands::Check(args) => upgrade::check(args).await,
            Commands::Upgrade(args) => upgrade::upgrade(args).await,
            Commands::Status => show_status().await,
            Commands::Config(args) => config::execute(args).await,
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn show_status() -> Result<()> {
    let store = SettingsStore::load().await?;
    let settings = store.settings();

    println!("Current version: {}", settings.version.bold());
    println!("Update source:   github.com/{}", settings.github_repo);
    println!(
        "Check on start:  {}",
        if settings.check_for_updates_on_startup {
            "yes"
        } else {
            "no"
        }
    );
    match settings.last_update_check {
        Some(at) => println!("Last check:      {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("Last check:      never"),
    }
    match settings.last_update {
        Some(at) => println!("Last update:     {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("Last update:     never"),
    }
    Ok(())
}
