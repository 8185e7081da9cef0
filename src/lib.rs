//! Reelbot - a fishing bot control panel that keeps itself up to date.
//!
//! Reelbot drives a timer-based fishing automation loop and ships with a
//! self-update engine that fetches new releases of the application from
//! GitHub, replaces the installed file tree, and relaunches the process.
//!
//! # Architecture Overview
//!
//! The crate is split into a small set of focused modules:
//!
//! - [`updater`] - The self-update engine: release checking, archive
//!   download/extraction, backup and file replacement, progress events,
//!   and process relaunch. This is the core of the application.
//! - [`version`] - Dotted-integer version parsing and ordering, built to
//!   never fail past its own boundary.
//! - [`config`] - Typed settings persisted as TOML (`~/.reelbot/config.toml`
//!   by default), preserving unknown keys written by other tools.
//! - [`bot`] - The fishing simulation loop and its session statistics.
//! - [`cli`] - Command-line interface (`run`, `check`, `upgrade`, `status`,
//!   `config`) with verbosity controls and progress rendering.
//! - [`core`] - Shared error types.
//!
//! # Update Flow
//!
//! ```text
//! check_for_updates()
//!    ├── ReleaseFetcher queries /repos/{repo}/releases/latest (10s timeout)
//!    ├── version::is_newer decides whether the tag is an upgrade
//!    └── emits `available` / `up-to-date` / `error` progress events
//!
//! install_update()
//!    ├── download archive to a private temp dir (streamed, 60s timeout)
//!    ├── extract fully before touching the live tree
//!    ├── back up the application directory (backup_<version>_<ts>)
//!    ├── replace top-level entries from the archive payload
//!    └── persist the new version to settings on success only
//! ```
//!
//! Progress is published on a typed event bus; the CLI renderer and any
//! other observers subscribe independently and never block the update flow.

pub mod bot;
pub mod cli;
pub mod config;
pub mod core;
pub mod updater;
pub mod utils;
pub mod version;
