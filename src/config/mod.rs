//! Application settings persisted as TOML.
//!
//! The settings file is the single source of truth for the installed
//! version, the remote repository the updater watches, and the bot's
//! tuning knobs. It lives at `~/.reelbot/config.toml` unless the
//! `REELBOT_CONFIG` environment variable points elsewhere.
//!
//! Every field the application understands is a named, typed struct
//! field. Keys written by other tools (or future versions) are carried
//! in an opaque table and survive a load/save round trip untouched,
//! but are never interpreted here.
//!
//! The update coordinator is the only writer of `version` and
//! `last_update`, and it writes them exclusively through
//! [`SettingsStore::record_installed_version`] after a verified install.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "REELBOT_CONFIG";

/// How a fish bite is detected by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Color,
    Motion,
    Sound,
}

impl DetectionMethod {
    /// Human-readable name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Motion => "motion",
            Self::Sound => "sound",
        }
    }
}

/// Tuning knobs for the fishing loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Seconds between casts when no bite is detected.
    #[serde(default = "default_cast_interval")]
    pub cast_interval_secs: u64,

    /// Which sensing placeholder the bot pretends to use.
    #[serde(default = "default_detection_method")]
    pub detection_method: DetectionMethod,

    /// Detection sensitivity, 0-100.
    #[serde(default = "default_detection_sensitivity")]
    pub detection_sensitivity: u8,

    /// Start the loop immediately when `reelbot run` launches.
    #[serde(default)]
    pub auto_start: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            cast_interval_secs: default_cast_interval(),
            detection_method: default_detection_method(),
            detection_sensitivity: default_detection_sensitivity(),
            auto_start: false,
        }
    }
}

fn default_cast_interval() -> u64 {
    30
}

fn default_detection_method() -> DetectionMethod {
    DetectionMethod::Color
}

fn default_detection_sensitivity() -> u8 {
    50
}

/// The full persisted settings record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Version of the currently installed application tree.
    #[serde(default = "default_version")]
    pub version: String,

    /// `owner/name` GitHub repository the updater watches.
    #[serde(default = "default_github_repo")]
    pub github_repo: String,

    /// When the updater last performed a real remote check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_check: Option<DateTime<Utc>>,

    /// When an update was last installed successfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,

    /// Check for updates when `reelbot run` starts.
    #[serde(default = "default_check_on_startup")]
    pub check_for_updates_on_startup: bool,

    /// Fishing loop settings.
    #[serde(default)]
    pub bot: BotSettings,

    /// Keys this build does not understand. Preserved verbatim on save,
    /// never interpreted.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            github_repo: default_github_repo(),
            last_update_check: None,
            last_update: None,
            check_for_updates_on_startup: default_check_on_startup(),
            bot: BotSettings::default(),
            extra: toml::Table::new(),
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_github_repo() -> String {
    "reelbot-dev/reelbot".to_string()
}

fn default_check_on_startup() -> bool {
    true
}

/// Owner of the settings file: loads, saves, and applies the two
/// mutations the update flow is allowed to make.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Resolve the settings file location.
    ///
    /// `REELBOT_CONFIG` wins when set (tests rely on this); otherwise
    /// `~/.reelbot/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        Ok(dirs::home_dir()
            .context("could not determine home directory")?
            .join(".reelbot")
            .join("config.toml"))
    }

    /// Load settings from the default location.
    pub async fn load() -> Result<Self> {
        Self::load_from(Self::default_path()?).await
    }

    /// Load settings from an explicit path.
    ///
    /// A missing file is not an error: defaults are materialized and
    /// written back so the file exists for the next tool that looks.
    pub async fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!("no settings file at {}, creating defaults", path.display());
            let store = Self {
                path,
                settings: Settings::default(),
            };
            store.save().await?;
            return Ok(store);
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("failed to parse settings in {}", path.display()))?;

        Ok(Self { path, settings })
    }

    /// Write the whole record back to disk.
    pub async fn save(&self) -> Result<()> {
        // Serializing through a Table keeps scalar keys ahead of the
        // [bot] table and whatever tables hide in `extra`.
        let table =
            toml::Table::try_from(&self.settings).context("failed to serialize settings")?;
        let content = table.to_string();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("failed to write settings to {}", self.path.display()))?;

        debug!("settings saved to {}", self.path.display());
        Ok(())
    }

    /// Read-only view of the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access for the CLI `config set` command.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Where the record lives on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamp `last_update_check` with the current time and persist.
    pub async fn record_check_time(&mut self) -> Result<()> {
        self.settings.last_update_check = Some(Utc::now());
        self.save().await
    }

    /// Record a completed install: the new `version` plus `last_update`.
    ///
    /// This is the only path that mutates `version`, and the coordinator
    /// calls it only after the install step fully succeeded, so the
    /// recorded version always matches the tree on disk.
    pub async fn record_installed_version(&mut self, version: &str) -> Result<()> {
        self.settings.version = version.to_string();
        self.settings.last_update = Some(Utc::now());
        self.save().await?;
        info!("recorded installed version {version}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_yields_defaults_and_writes_them() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let store = SettingsStore::load_from(path.clone()).await.unwrap();
        assert_eq!(store.settings().version, "1.0.0");
        assert!(store.settings().check_for_updates_on_startup);
        assert_eq!(store.settings().bot.cast_interval_secs, 30);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn unknown_keys_survive_a_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(
            &path,
            "version = \"1.1.0\"\nmystery_key = \"keep me\"\n\n[ui_settings]\ntheme = \"dark\"\n",
        )
        .await
        .unwrap();

        let store = SettingsStore::load_from(path.clone()).await.unwrap();
        assert_eq!(store.settings().version, "1.1.0");
        store.save().await.unwrap();

        let rewritten = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(rewritten.contains("mystery_key"));
        assert!(rewritten.contains("keep me"));
        assert!(rewritten.contains("theme"));
    }

    #[tokio::test]
    async fn record_installed_version_updates_version_and_timestamp() {
        let temp = TempDir::new().unwrap();
        let mut store = SettingsStore::load_from(temp.path().join("config.toml"))
            .await
            .unwrap();
        assert!(store.settings().last_update.is_none());

        store.record_installed_version("1.2.0").await.unwrap();
        assert_eq!(store.settings().version, "1.2.0");
        assert!(store.settings().last_update.is_some());
        assert!(store.settings().last_update_check.is_none());

        let reloaded = SettingsStore::load_from(store.path().to_path_buf())
            .await
            .unwrap();
        assert_eq!(reloaded.settings().version, "1.2.0");
    }

    #[tokio::test]
    async fn record_check_time_only_touches_check_field() {
        let temp = TempDir::new().unwrap();
        let mut store = SettingsStore::load_from(temp.path().join("config.toml"))
            .await
            .unwrap();

        store.record_check_time().await.unwrap();
        assert!(store.settings().last_update_check.is_some());
        assert!(store.settings().last_update.is_none());
        assert_eq!(store.settings().version, "1.0.0");
    }

    #[test]
    fn detection_method_serializes_lowercase() {
        assert_eq!(DetectionMethod::Color.as_str(), "color");
        let toml = toml::to_string(&BotSettings::default()).unwrap();
        assert!(toml.contains("detection_method = \"color\""));
    }
}
