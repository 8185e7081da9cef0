//! Self-update engine.
//!
//! Checks the configured GitHub repository for a newer release, downloads
//! its archive asset, and replaces the installed application tree — while
//! the application is running — then optionally relaunches the process.
//!
//! # Components
//!
//! - [`release::ReleaseFetcher`] - queries the latest-release endpoint,
//!   picks the archive asset, and decides whether the tag is an upgrade.
//!   Rate-limits itself to one unforced check per hour.
//! - [`install::ArchiveInstaller`] - streams the archive to a private
//!   temp location, extracts it fully, backs up the current tree into
//!   `backup_<version>_<timestamp>`, and overwrites top-level entries.
//! - [`coordinator::UpdateCoordinator`] - drives the whole lifecycle,
//!   absorbs every error into an `error` progress event, guards against
//!   concurrent installs, and persists the new version on success.
//! - [`events::ProgressBus`] - typed `(status, percent, message)` events
//!   delivered to any number of independent subscribers.
//! - [`restart`] - best-effort relaunch of the process after an install.
//!
//! # Safety model
//!
//! Nothing upstream of a failing step is left half-applied: the archive
//! is extracted in full before the live tree is read, the backup is
//! written before any live file changes, and temp state is removed on
//! every exit path. The one acknowledged gap is the replace step itself,
//! which overwrites entries in place and is not atomic as a whole; the
//! backup directory is the manual recovery path. Backups are never
//! deleted or restored automatically.

pub mod coordinator;
pub mod events;
pub mod install;
pub mod release;
pub mod restart;


pub use coordinator::UpdateCoordinator;
pub use events::{ProgressBus, UpdateProgress, UpdateStatus};
pub use release::{CheckOutcome, ReleaseFetcher, UpdateInfo};
