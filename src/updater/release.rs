//! GitHub latest-release querying.
//!
//! One HTTP GET against `/repos/{owner}/{name}/releases/latest`, a parse
//! of the interesting fields, and a decision: is the tagged version newer
//! than what is running? The fetcher also rate-limits itself so unforced
//! checks inside the cooldown window cost no network traffic at all.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::core::UpdateError;
use crate::version;

/// Default GitHub API endpoint. Tests point the fetcher at a mock server.
const GITHUB_API_BASE: &str = "https://api.github.com";

/// Release checks must answer quickly; downloads get their own timeout.
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum interval between unforced remote checks.
const CHECK_COOLDOWN: Duration = Duration::from_secs(3600);

/// GitHub requires a User-Agent on API requests.
pub(crate) const USER_AGENT: &str = concat!("reelbot/", env!("CARGO_PKG_VERSION"));

/// Asset name suffixes the installer knows how to unpack.
pub const ARCHIVE_EXTENSIONS: &[&str] = &[".zip"];

/// Everything the caller needs to present and install one update.
///
/// Only produced when the release carries a usable archive asset, so
/// `download_url` is always non-empty.
#[derive(Debug, Clone)]
pub struct UpdateInfo {
    /// Version of the running build at check time.
    pub current_version: String,
    /// Remote tag with any leading `v` stripped.
    pub latest_version: String,
    /// Remote `published_at`, when present.
    pub release_date: Option<DateTime<Utc>>,
    /// Remote release body, empty when absent.
    pub release_notes: String,
    /// Download URL of the selected archive asset.
    pub download_url: String,
    /// Original filename of that asset.
    pub asset_name: String,
}

/// Result of one release check.
#[derive(Debug)]
pub enum CheckOutcome {
    /// A newer release with an archive asset exists.
    UpdateAvailable(UpdateInfo),
    /// The remote tag is not newer than the running version.
    UpToDate,
    /// The repository has no published release (HTTP 404).
    NoRelease,
    /// The cooldown window suppressed the check; nothing was queried.
    Skipped,
}

/// GitHub release metadata, trimmed to the fields this crate consumes.
#[derive(Debug, Deserialize)]
struct GithubRelease {
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

/// GitHub release asset.
#[derive(Debug, Deserialize)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
}

/// Queries the latest published release for a repository.
#[derive(Debug)]
pub struct ReleaseFetcher {
    client: reqwest::Client,
    api_base: String,
    cooldown: Duration,
    last_check: Mutex<Option<Instant>>,
}

impl ReleaseFetcher {
    /// Build a fetcher with the production endpoint and cooldown.
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(CHECK_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_base: GITHUB_API_BASE.to_string(),
            cooldown: CHECK_COOLDOWN,
            last_check: Mutex::new(None),
        })
    }

    /// Override the API base URL (mock servers in tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Override the cooldown window.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Whether an unforced check right now would be suppressed.
    pub fn in_cooldown(&self) -> bool {
        self.last_check
            .lock()
            .expect("release fetcher lock poisoned")
            .map(|at| at.elapsed() < self.cooldown)
            .unwrap_or(false)
    }

    /// Check the latest published release of `repo` (`owner/name`).
    ///
    /// Network transport failures, non-404 error statuses, undecodable
    /// payloads, a missing tag, and a release without any recognized
    /// archive asset are all [`UpdateError`]s. A 404 and a tag that is
    /// not newer than `current_version` are ordinary non-error outcomes.
    pub async fn fetch_latest(
        &self,
        repo: &str,
        current_version: &str,
        force: bool,
    ) -> Result<CheckOutcome, UpdateError> {
        {
            let mut last_check = self
                .last_check
                .lock()
                .expect("release fetcher lock poisoned");
            if !force
                && last_check.map(|at| at.elapsed() < self.cooldown).unwrap_or(false)
            {
                info!("update check skipped (checked recently)");
                return Ok(CheckOutcome::Skipped);
            }
            *last_check = Some(Instant::now());
        }

        let url = format!("{}/repos/{repo}/releases/latest", self.api_base);
        debug!("querying latest release at {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UpdateError::network("querying latest release", &e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            info!("no published release for {repo}");
            return Ok(CheckOutcome::NoRelease);
        }
        if !response.status().is_success() {
            return Err(UpdateError::Network {
                operation: "querying latest release".to_string(),
                reason: format!("unexpected status {}", response.status()),
            });
        }

        let payload = response
            .text()
            .await
            .map_err(|e| UpdateError::network("reading release response", &e))?;
        let release: GithubRelease =
            serde_json::from_str(&payload).map_err(|e| UpdateError::MalformedRelease {
                reason: format!("undecodable release payload: {e}"),
            })?;

        let tag = release
            .tag_name
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| UpdateError::MalformedRelease {
                reason: "release has no version tag".to_string(),
            })?;
        let latest_version = tag.trim_start_matches(['v', 'V']).to_string();

        if !version::is_newer(&latest_version, current_version) {
            debug!("no updates available ({latest_version} is not newer than {current_version})");
            return Ok(CheckOutcome::UpToDate);
        }

        let asset = release
            .assets
            .iter()
            .find(|asset| {
                ARCHIVE_EXTENSIONS
                    .iter()
                    .any(|ext| asset.name.ends_with(ext))
            })
            .ok_or_else(|| {
                warn!("release {tag} of {repo} carries no archive asset");
                UpdateError::MalformedRelease {
                    reason: "no archive asset in release".to_string(),
                }
            })?;

        info!("update available: {current_version} -> {latest_version}");
        Ok(CheckOutcome::UpdateAvailable(UpdateInfo {
            current_version: current_version.to_string(),
            latest_version,
            release_date: release.published_at,
            release_notes: release.body.unwrap_or_default(),
            download_url: asset.browser_download_url.clone(),
            asset_name: asset.name.clone(),
        }))
    }
}
