//! `run` command: start the fishing loop.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::bot::{FishingBot, run_until_interrupt};
use crate::cli::upgrade;
use crate::config::SettingsStore;
use crate::updater::UpdateCoordinator;

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Skip the startup update check even if settings enable it.
    #[arg(long)]
    pub no_update_check: bool,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let store = SettingsStore::load().await?;
    let bot_settings = store.settings().bot.clone();
    let check_on_startup = store.settings().check_for_updates_on_startup;

    // Notification only; installing stays an explicit `reelbot upgrade`.
    if check_on_startup && !args.no_update_check {
        let coordinator = UpdateCoordinator::new(store, upgrade::app_root()?)?;
        if let Some(info) = coordinator.check_for_updates(false).await {
            println!(
                "{}",
                format!(
                    "Update available: {} -> {} (run `reelbot upgrade`)",
                    info.current_version, info.latest_version
                )
                .yellow()
            );
        }
    }

    println!("{}", "Starting fishing bot (Ctrl-C to stop)".cyan());
    let stats = run_until_interrupt(FishingBot::new(bot_settings)).await;

    let minutes = stats.session_secs / 60.0;
    println!(
        "Session over: {} fish in {minutes:.1} min ({:.1} fish/hour)",
        stats.fish_caught, stats.fish_per_hour
    );
    Ok(())
}
