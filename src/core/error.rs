//! Error handling for the self-update engine.
//!
//! Every failure mode of a check or install run maps onto one
//! [`UpdateError`] variant. The update coordinator is the only boundary
//! these errors cross: it converts them into `error` progress events and
//! log lines, so callers of the coordinator never see a raised fault.
//!
//! Version parse failures are deliberately *not* part of this taxonomy:
//! they degrade to "not newer" inside [`crate::version`] and never abort
//! a check.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while checking for or installing an update.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Timeout, connection failure, or an unexpected HTTP status.
    ///
    /// A 404 from the latest-release endpoint is *not* a network error;
    /// it is the normal "no published release" answer and is handled
    /// before this variant can be produced.
    #[error("network error while {operation}: {reason}")]
    Network {
        /// What was being attempted ("querying latest release", ...).
        operation: String,
        /// Transport-level detail, suitable for display.
        reason: String,
    },

    /// The release endpoint answered, but the payload is unusable:
    /// missing version tag, undecodable JSON, or no archive asset.
    #[error("malformed release: {reason}")]
    MalformedRelease {
        /// Which expectation the payload violated.
        reason: String,
    },

    /// The downloaded archive could not be opened or extracted.
    #[error("archive error: {reason}")]
    Archive {
        /// Detail from the archive reader.
        reason: String,
    },

    /// Backup or replace step I/O failure.
    #[error("filesystem error while {operation} ({})", .path.display())]
    Filesystem {
        /// What was being attempted ("backing up application files", ...).
        operation: String,
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl UpdateError {
    /// Network error from a reqwest failure, labelling timeouts explicitly.
    pub fn network(operation: impl Into<String>, err: &reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            format!("timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        Self::Network {
            operation: operation.into(),
            reason,
        }
    }

    /// Filesystem error with the operation and path that failed.
    pub fn filesystem(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_error_mentions_operation_and_path() {
        let err = UpdateError::filesystem(
            "backing up application files",
            "/opt/reelbot",
            std::io::Error::other("disk full"),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("backing up application files"));
        assert!(rendered.contains("/opt/reelbot"));
    }

    #[test]
    fn malformed_release_carries_reason() {
        let err = UpdateError::MalformedRelease {
            reason: "no archive asset in release".to_string(),
        };
        assert!(err.to_string().contains("no archive asset"));
    }
}
