//! Typed progress events for the update flow.
//!
//! Every stage of a check or install run publishes `(status, percent,
//! message)` events on a [`ProgressBus`]. Subscribers (the CLI renderer,
//! the log layer, tests) each get their own channel; publishing is
//! fire-and-forget and never blocks the update flow, and a subscriber
//! that goes away is silently dropped.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Phase of an update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateStatus {
    /// Querying the release endpoint.
    Checking,
    /// No newer release exists (or none is published).
    UpToDate,
    /// A newer release was found; waiting on the caller to confirm.
    Available,
    /// Streaming the archive to disk.
    Downloading,
    /// Unpacking the archive into a staging directory.
    Extracting,
    /// Backing up and replacing the live tree.
    Installing,
    /// Install finished and the new version was recorded.
    Complete,
    /// The run failed; the message carries the reason.
    Error,
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Checking => "checking",
            Self::UpToDate => "up-to-date",
            Self::Available => "available",
            Self::Downloading => "downloading",
            Self::Extracting => "extracting",
            Self::Installing => "installing",
            Self::Complete => "complete",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// One progress event.
///
/// `percent` is 0-100 and non-decreasing within a run, except that each
/// phase may reset it to its own baseline and an error resets to 0.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateProgress {
    pub status: UpdateStatus,
    pub percent: u8,
    pub message: String,
}

/// Fan-out channel for [`UpdateProgress`] events.
///
/// The update flow may publish from any task; delivery uses unbounded
/// channels so a slow subscriber can never stall a download.
#[derive(Debug, Default)]
pub struct ProgressBus {
    subscribers: Mutex<Vec<UnboundedSender<UpdateProgress>>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    ///
    /// The receiver sees every event published after this call and closes
    /// once the bus is dropped.
    pub fn subscribe(&self) -> UnboundedReceiver<UpdateProgress> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("progress bus lock poisoned")
            .push(tx);
        rx
    }

    /// Publish an event to every live subscriber.
    pub fn publish(&self, status: UpdateStatus, percent: u8, message: impl Into<String>) {
        let event = UpdateProgress {
            status,
            percent,
            message: message.into(),
        };
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("progress bus lock poisoned");
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_receives_events() {
        let bus = ProgressBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(UpdateStatus::Checking, 0, "Checking for updates...");

        let ev = a.try_recv().unwrap();
        assert_eq!(ev.status, UpdateStatus::Checking);
        assert_eq!(ev.percent, 0);
        let ev = b.try_recv().unwrap();
        assert_eq!(ev.message, "Checking for updates...");
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = ProgressBus::new();
        let rx = bus.subscribe();
        drop(rx);

        // Must not panic or error with no one listening.
        bus.publish(UpdateStatus::Downloading, 25, "Downloading: 1/4 bytes");
        assert_eq!(bus.subscribers.lock().unwrap().len(), 0);
    }

    #[test]
    fn status_labels_match_the_wire_format() {
        assert_eq!(UpdateStatus::UpToDate.to_string(), "up-to-date");
        assert_eq!(UpdateStatus::Error.to_string(), "error");
        assert_eq!(
            serde_json::to_string(&UpdateStatus::UpToDate).unwrap(),
            "\"up-to-date\""
        );
    }
}
