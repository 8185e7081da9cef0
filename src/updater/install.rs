//! Archive download, extraction, backup, and file replacement.
//!
//! The installer never touches the live application tree until the new
//! tree is fully downloaded and extracted into private temp directories,
//! and it backs up the current tree before replacing anything. The
//! replace step itself overwrites top-level entries one by one and is
//! not atomic as a whole; a crash mid-replace leaves a mixed tree, and
//! the backup from the previous step is the recovery path.
//!
//! Temp directories are [`tempfile::TempDir`]s, so the downloaded
//! archive and the staging tree are removed on every exit path.

use futures::StreamExt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::UpdateError;
use crate::updater::events::{ProgressBus, UpdateStatus};
use crate::updater::release::{USER_AGENT, UpdateInfo};
use crate::utils::fs as fsutil;

/// Downloads get a generous timeout compared to the 10s release check.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Top-level entries never copied into a backup: earlier backups and
/// ephemeral state that would only bloat the snapshot.
const EPHEMERAL_ENTRIES: &[&str] = &["cache", "logs", "tmp"];

/// Directory-name prefix of backup snapshots.
const BACKUP_PREFIX: &str = "backup_";

/// Download percentage for `received` of `total` bytes: the download
/// phase owns the 10-40 band of the overall run.
pub(crate) fn download_percent(received: u64, total: u64) -> u8 {
    (10 + 30 * received / total) as u8
}

/// Downloads a release archive and installs it over the application tree.
#[derive(Debug)]
pub struct ArchiveInstaller {
    client: reqwest::Client,
}

impl ArchiveInstaller {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Run the full install: download, extract, back up, replace.
    ///
    /// Progress is published on `events` around every step. On any error
    /// the live tree under `app_root` is unchanged, except for the
    /// acknowledged non-atomicity of the replace step itself.
    pub async fn install(
        &self,
        info: &UpdateInfo,
        app_root: &Path,
        events: &ProgressBus,
    ) -> Result<(), UpdateError> {
        let staging = tempfile::tempdir().map_err(|e| {
            UpdateError::filesystem("creating staging directory", std::env::temp_dir(), e)
        })?;

        // Step 1: stream the archive to disk.
        let archive_path = staging.path().join(&info.asset_name);
        events.publish(UpdateStatus::Downloading, 10, "Downloading update...");
        self.download(&info.download_url, &archive_path, events)
            .await?;

        // Step 2: extract fully before the live tree is touched.
        events.publish(UpdateStatus::Extracting, 40, "Extracting update...");
        let extract_dir = staging.path().join("extracted");
        extract_archive(&archive_path, &extract_dir)?;

        // Step 3: snapshot the current tree.
        events.publish(
            UpdateStatus::Installing,
            60,
            "Backing up current installation...",
        );
        let backup_dir = backup_tree(app_root, &info.current_version)?;
        info!("backed up application tree to {}", backup_dir.display());

        // Step 4: overwrite top-level entries from the payload.
        events.publish(UpdateStatus::Installing, 80, "Installing update...");
        let payload = payload_root(&extract_dir).map_err(|e| {
            UpdateError::filesystem("reading extracted archive", &extract_dir, e)
        })?;
        replace_tree(&payload, app_root)
            .map_err(|e| UpdateError::filesystem("installing new files", app_root, e))?;

        info!(
            "installed version {} over {}",
            info.latest_version,
            app_root.display()
        );
        Ok(())
    }

    /// Stream `url` into `dest`, publishing download progress.
    ///
    /// With a known `Content-Length` the percentage walks from 10 to 40;
    /// without one it holds at 10 and the message carries raw byte counts.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        events: &ProgressBus,
    ) -> Result<(), UpdateError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| UpdateError::network("downloading update archive", &e))?;

        let total = response.content_length().filter(|len| *len > 0);
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| UpdateError::filesystem("creating download file", dest, e))?;

        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| UpdateError::network("downloading update archive", &e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| UpdateError::filesystem("writing download file", dest, e))?;
            received += chunk.len() as u64;

            match total {
                Some(total) => events.publish(
                    UpdateStatus::Downloading,
                    download_percent(received, total),
                    format!("Downloading: {received}/{total} bytes"),
                ),
                None => events.publish(
                    UpdateStatus::Downloading,
                    10,
                    format!("Downloading: {received} bytes"),
                ),
            }
        }
        file.flush()
            .await
            .map_err(|e| UpdateError::filesystem("writing download file", dest, e))?;

        debug!("downloaded {received} bytes from {url}");
        Ok(())
    }
}

/// Unpack a zip archive into `dest`.
fn extract_archive(archive_path: &Path, dest: &Path) -> Result<(), UpdateError> {
    fsutil::ensure_dir(dest)
        .map_err(|e| UpdateError::filesystem("creating extraction directory", dest, e))?;

    let file = fs::File::open(archive_path)
        .map_err(|e| UpdateError::filesystem("opening downloaded archive", archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| UpdateError::Archive {
        reason: format!("unreadable archive: {e}"),
    })?;
    archive.extract(dest).map_err(|e| UpdateError::Archive {
        reason: format!("extraction failed: {e}"),
    })?;
    Ok(())
}

/// Whether a top-level entry is skipped when snapshotting.
fn excluded_from_backup(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) || EPHEMERAL_ENTRIES.contains(&name)
}

/// Copy the application tree into a fresh `backup_<version>_<ts>`
/// directory next to it. Nothing in the live tree is modified.
fn backup_tree(app_root: &Path, current_version: &str) -> Result<PathBuf, UpdateError> {
    let backup_dir = app_root.join(format!(
        "{BACKUP_PREFIX}{current_version}_{}",
        chrono::Utc::now().timestamp()
    ));
    let wrap =
        |e: io::Error| UpdateError::filesystem("backing up application files", &backup_dir, e);

    fsutil::ensure_dir(&backup_dir).map_err(wrap)?;
    for entry in fs::read_dir(app_root).map_err(wrap)? {
        let entry = entry.map_err(wrap)?;
        let name = entry.file_name();
        if excluded_from_backup(&name.to_string_lossy()) {
            continue;
        }
        let src = entry.path();
        let dst = backup_dir.join(&name);
        if entry.file_type().map_err(wrap)?.is_dir() {
            fsutil::copy_dir_all(&src, &dst).map_err(wrap)?;
        } else {
            fs::copy(&src, &dst).map_err(wrap)?;
        }
    }
    Ok(backup_dir)
}

/// The directory whose entries get copied over the application tree.
///
/// GitHub archives conventionally wrap everything in a single root
/// folder; when extraction yields exactly one directory, that folder is
/// the payload. Anything else means the archive was flat.
fn payload_root(extract_dir: &Path) -> io::Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(extract_dir)?.collect::<io::Result<Vec<_>>>()?;
    if let [only] = entries.as_slice() {
        if only.file_type()?.is_dir() {
            return Ok(only.path());
        }
    }
    Ok(extract_dir.to_path_buf())
}

/// Overwrite every top-level entry of `app_root` that the payload
/// provides: directories are replaced whole, files overwritten. Entries
/// the payload does not mention are left alone.
fn replace_tree(payload: &Path, app_root: &Path) -> io::Result<()> {
    for entry in fs::read_dir(payload)? {
        let entry = entry?;
        let src = entry.path();
        let dst = app_root.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fsutil::replace_dir(&src, &dst)?;
        } else {
            fsutil::replace_file(&src, &dst)?;
        }
    }
    Ok(())
}
