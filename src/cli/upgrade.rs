//! `check` and `upgrade` commands: the interactive face of the updater.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::config::SettingsStore;
use crate::updater::{UpdateCoordinator, UpdateInfo, UpdateProgress, UpdateStatus, restart};

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Check even if one ran within the cooldown window.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct UpgradeArgs {
    /// Check even if one ran within the cooldown window.
    #[arg(short, long)]
    pub force: bool,

    /// Install without asking for confirmation.
    #[arg(short, long)]
    pub yes: bool,

    /// Relaunch the application after a successful install.
    #[arg(long)]
    pub restart: bool,
}

/// The directory whose contents get replaced by an install: where the
/// running executable lives.
pub(crate) fn app_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate current executable")?;
    Ok(exe
        .parent()
        .context("executable has no parent directory")?
        .to_path_buf())
}

async fn build_coordinator() -> Result<UpdateCoordinator> {
    let store = SettingsStore::load().await?;
    UpdateCoordinator::new(store, app_root()?)
}

pub async fn check(args: CheckArgs) -> Result<()> {
    let coordinator = build_coordinator().await?;
    let current = coordinator.current_version().await;
    let mut rx = coordinator.subscribe();
    println!("{}", "Checking for updates...".cyan());

    match coordinator.check_for_updates(args.force).await {
        Some(info) => {
            print_release(&info);
            println!("Run {} to install it", "reelbot upgrade".cyan().bold());
        }
        None => report_no_update(&mut rx, &current),
    }
    Ok(())
}

pub async fn upgrade(args: UpgradeArgs) -> Result<()> {
    let coordinator = build_coordinator().await?;
    let current = coordinator.current_version().await;
    let mut check_rx = coordinator.subscribe();

    println!("{}", "Checking for updates...".cyan());
    let Some(info) = coordinator.check_for_updates(args.force).await else {
        report_no_update(&mut check_rx, &current);
        return Ok(());
    };
    drop(check_rx);

    print_release(&info);
    if !args.yes && !confirm("Install now?")? {
        println!("Update skipped");
        return Ok(());
    }

    let renderer = spawn_renderer(coordinator.subscribe());
    let installed = coordinator.install_update(&info).await;
    drop(coordinator);
    renderer.await.ok();

    if !installed {
        anyhow::bail!("update to {} failed; see messages above", info.latest_version);
    }

    println!(
        "{}",
        format!("Updated {current} -> {}", info.latest_version).green().bold()
    );
    if args.restart {
        if restart::relaunch() {
            println!("Restarting...");
            std::process::exit(0);
        }
        println!("{}", "Relaunch failed; restart manually to finish".yellow());
    } else {
        println!("Restart the application to run the new version");
    }
    Ok(())
}

/// A `None` from a check is either "up to date" or an absorbed failure;
/// the emitted events tell them apart.
fn report_no_update(rx: &mut UnboundedReceiver<UpdateProgress>, current: &str) {
    let mut failed = false;
    while let Ok(event) = rx.try_recv() {
        if event.status == UpdateStatus::Error {
            eprintln!("{}", event.message.red());
            failed = true;
        }
    }
    if !failed {
        println!(
            "{}",
            format!("You are on the latest version ({current})").green()
        );
    }
}

fn print_release(info: &UpdateInfo) {
    println!(
        "{}",
        format!(
            "Update available: {} -> {}",
            info.current_version,
            info.latest_version.bold()
        )
        .green()
    );
    if let Some(date) = info.release_date {
        println!("Released: {}", date.format("%Y-%m-%d %H:%M UTC"));
    }
    if !info.release_notes.trim().is_empty() {
        println!("\n{}\n", info.release_notes.trim());
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Render progress events until the coordinator (and with it the bus) is
/// dropped. Download events drive an indicatif bar; everything else is a
/// status line.
fn spawn_renderer(mut rx: UnboundedReceiver<UpdateProgress>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;
        while let Some(event) = rx.recv().await {
            match event.status {
                UpdateStatus::Downloading => {
                    let bar = bar.get_or_insert_with(|| {
                        let bar = ProgressBar::new(100);
                        bar.set_style(
                            ProgressStyle::default_bar()
                                .template("{prefix:.cyan} [{bar:40.cyan/blue}] {pos}% {msg}")
                                .unwrap()
                                .progress_chars("━╸━"),
                        );
                        bar.set_prefix("downloading");
                        bar
                    });
                    bar.set_position(u64::from(event.percent));
                    bar.set_message(event.message);
                }
                UpdateStatus::Error => {
                    if let Some(bar) = bar.take() {
                        bar.abandon();
                    }
                    eprintln!("{}", event.message.red());
                }
                _ => {
                    if let Some(bar) = bar.take() {
                        bar.finish_and_clear();
                    }
                    println!("{}", event.message.cyan());
                }
            }
        }
    })
}
