//! Orchestration of one update lifecycle.
//!
//! `Idle -> Checking -> {UpToDate | Available} -> (caller confirms) ->
//! Installing -> {Complete | Error}`
//!
//! The coordinator is the error boundary of the whole subsystem: every
//! failure inside a check or install is converted into an `error`
//! progress event plus a log line, and the caller only ever sees
//! `Option<UpdateInfo>` / `bool`. It is also the only writer of the
//! persisted `version` and `last_update` fields, and writes them strictly
//! after a fully successful install.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::config::SettingsStore;
use crate::updater::events::{ProgressBus, UpdateProgress, UpdateStatus};
use crate::updater::install::ArchiveInstaller;
use crate::updater::release::{CheckOutcome, ReleaseFetcher, UpdateInfo};

/// RAII holder of the install-in-progress flag.
///
/// Acquisition is a compare-and-set, so exactly one install can hold it;
/// dropping releases it on every exit path, including unwinding.
pub(crate) struct InstallGuard<'a>(&'a AtomicBool);

impl<'a> InstallGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for InstallGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the check -> confirm -> install -> persist flow.
///
/// One coordinator owns one install guard; at most one install runs per
/// instance at a time. Progress events go out on an internal
/// [`ProgressBus`]; call [`subscribe`](Self::subscribe) to observe them.
pub struct UpdateCoordinator {
    fetcher: ReleaseFetcher,
    installer: ArchiveInstaller,
    settings: Mutex<SettingsStore>,
    events: Arc<ProgressBus>,
    app_root: PathBuf,
    install_in_progress: AtomicBool,
}

impl UpdateCoordinator {
    /// Build a coordinator managing the tree at `app_root`.
    pub fn new(settings: SettingsStore, app_root: PathBuf) -> anyhow::Result<Self> {
        Ok(Self {
            fetcher: ReleaseFetcher::new()?,
            installer: ArchiveInstaller::new()?,
            settings: Mutex::new(settings),
            events: Arc::new(ProgressBus::new()),
            app_root,
            install_in_progress: AtomicBool::new(false),
        })
    }

    /// Swap in a differently-configured fetcher (tests use a mock API).
    pub fn with_fetcher(mut self, fetcher: ReleaseFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Observe progress events from this coordinator.
    pub fn subscribe(&self) -> UnboundedReceiver<UpdateProgress> {
        self.events.subscribe()
    }

    /// The currently installed version, per the settings store.
    pub async fn current_version(&self) -> String {
        self.settings.lock().await.settings().version.clone()
    }

    /// Check the remote repository for a newer release.
    ///
    /// Emits `checking` and then one of `available` / `up-to-date` /
    /// `error`. Unforced calls inside the cooldown window return `None`
    /// without any network traffic or events. Errors never propagate:
    /// they become an `error` event and `None`.
    pub async fn check_for_updates(&self, force: bool) -> Option<UpdateInfo> {
        if !force && self.fetcher.in_cooldown() {
            debug!("update check skipped (checked recently)");
            return None;
        }

        let (repo, current_version) = {
            let store = self.settings.lock().await;
            (
                store.settings().github_repo.clone(),
                store.settings().version.clone(),
            )
        };

        self.events
            .publish(UpdateStatus::Checking, 0, "Checking for updates...");

        let outcome = self
            .fetcher
            .fetch_latest(&repo, &current_version, force)
            .await;

        match outcome {
            Ok(CheckOutcome::UpdateAvailable(info)) => {
                self.record_check_time().await;
                self.events.publish(
                    UpdateStatus::Available,
                    100,
                    format!("Update available: {}", info.latest_version),
                );
                Some(info)
            }
            Ok(CheckOutcome::UpToDate) => {
                self.record_check_time().await;
                self.events
                    .publish(UpdateStatus::UpToDate, 100, "No updates available");
                None
            }
            Ok(CheckOutcome::NoRelease) => {
                self.record_check_time().await;
                self.events.publish(
                    UpdateStatus::UpToDate,
                    100,
                    format!("No published releases for {repo}"),
                );
                None
            }
            Ok(CheckOutcome::Skipped) => None,
            Err(e) => {
                error!("error checking for updates: {e}");
                self.events.publish(
                    UpdateStatus::Error,
                    0,
                    format!("Update check failed: {e}"),
                );
                None
            }
        }
    }

    /// Download and install `info`, then persist the new version.
    ///
    /// Returns `false` immediately (no I/O, no events beyond a log line)
    /// when another install on this coordinator is already running. On
    /// failure the settings are untouched, so the recorded version always
    /// matches the tree that is actually installed.
    pub async fn install_update(&self, info: &UpdateInfo) -> bool {
        let Some(_guard) = InstallGuard::acquire(&self.install_in_progress) else {
            warn!("update already in progress");
            return false;
        };

        match self
            .installer
            .install(info, &self.app_root, &self.events)
            .await
        {
            Ok(()) => {
                let mut store = self.settings.lock().await;
                if let Err(e) = store.record_installed_version(&info.latest_version).await {
                    // The new tree is live; a stale recorded version is
                    // recoverable by re-running the check.
                    error!(
                        "installed {} but failed to persist settings: {e:#}",
                        info.latest_version
                    );
                }
                drop(store);
                info!("update to {} completed", info.latest_version);
                self.events.publish(
                    UpdateStatus::Complete,
                    100,
                    "Update completed successfully!",
                );
                true
            }
            Err(e) => {
                error!("update installation failed: {e}");
                self.events
                    .publish(UpdateStatus::Error, 0, format!("Update failed: {e}"));
                false
            }
        }
    }

    async fn record_check_time(&self) {
        let mut store = self.settings.lock().await;
        if let Err(e) = store.record_check_time().await {
            warn!("failed to record update check time: {e:#}");
        }
    }
}
