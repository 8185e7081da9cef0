//! `config` command: show and edit settings.
//!
//! `set` understands only the keys the application itself reads; keys
//! preserved from other tools stay opaque and cannot be edited here.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::config::{DetectionMethod, SettingsStore};

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the settings file as TOML.
    Show,
    /// Set one known setting, e.g. `config set github_repo owner/name`.
    Set {
        /// One of: github_repo, check_for_updates_on_startup,
        /// bot.cast_interval_secs, bot.detection_method,
        /// bot.detection_sensitivity, bot.auto_start
        key: String,
        value: String,
    },
}

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => show().await,
        ConfigAction::Set { key, value } => set(&key, &value).await,
    }
}

async fn show() -> Result<()> {
    let store = SettingsStore::load().await?;
    let table = toml::Table::try_from(store.settings())?;
    print!("{table}");
    Ok(())
}

async fn set(key: &str, value: &str) -> Result<()> {
    let mut store = SettingsStore::load().await?;
    let settings = store.settings_mut();

    match key {
        "github_repo" => {
            if !value.contains('/') {
                bail!("github_repo must be of the form owner/name");
            }
            settings.github_repo = value.to_string();
        }
        "check_for_updates_on_startup" => {
            settings.check_for_updates_on_startup = parse_bool(value)?;
        }
        "bot.cast_interval_secs" => {
            settings.bot.cast_interval_secs = value
                .parse()
                .with_context(|| format!("'{value}' is not a number of seconds"))?;
        }
        "bot.detection_method" => {
            settings.bot.detection_method = match value {
                "color" => DetectionMethod::Color,
                "motion" => DetectionMethod::Motion,
                "sound" => DetectionMethod::Sound,
                other => bail!("unknown detection method '{other}' (color, motion, sound)"),
            };
        }
        "bot.detection_sensitivity" => {
            let sensitivity: u8 = value
                .parse()
                .with_context(|| format!("'{value}' is not a number"))?;
            if sensitivity > 100 {
                bail!("detection sensitivity must be 0-100");
            }
            settings.bot.detection_sensitivity = sensitivity;
        }
        "bot.auto_start" => {
            settings.bot.auto_start = parse_bool(value)?;
        }
        other => bail!("unknown setting '{other}'"),
    }

    store.save().await?;
    println!("{key} = {value}");
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        other => bail!("'{other}' is not a boolean (true/false)"),
    }
}
