//! Status and notification events for whatever shell is attached
//!
//! The controller never renders anything. It pushes plain [`StatusEvent`]s into
//! a channel; the binary drains them into the log, a GUI could show them.

use std::sync::mpsc::{Receiver, Sender, channel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// One-line status bar text
    Status(String),
    /// User-facing notification
    Notify {
        title: String,
        body: String,
        level: NotifyLevel,
    },
}

/// Cloneable sending half handed to every producer
#[derive(Clone)]
pub struct StatusReporter {
    tx: Sender<StatusEvent>,
}

impl StatusReporter {
    pub fn new() -> (Self, Receiver<StatusEvent>) {
        let (tx, rx) = channel();
        (Self { tx }, rx)
    }

    pub fn status(&self, text: impl Into<String>) {
        // Nobody listening is fine
        let _ = self.tx.send(StatusEvent::Status(text.into()));
    }

    pub fn notify(&self, title: &str, body: impl Into<String>) {
        let _ = self.tx.send(StatusEvent::Notify {
            title: title.to_string(),
            body: body.into(),
            level: NotifyLevel::Info,
        });
    }

    pub fn notify_error(&self, title: &str, body: impl Into<String>) {
        let _ = self.tx.send(StatusEvent::Notify {
            title: title.to_string(),
            body: body.into(),
            level: NotifyLevel::Error,
        });
    }
}

/// Log every event until all reporters are dropped
pub fn drain_to_log(rx: Receiver<StatusEvent>) {
    for event in rx {
        match event {
            StatusEvent::Status(text) => tracing::info!(target: "savesync::status", "{}", text),
            StatusEvent::Notify {
                title,
                body,
                level: NotifyLevel::Info,
            } => tracing::info!(target: "savesync::notify", %title, "{}", body),
            StatusEvent::Notify {
                title,
                body,
                level: NotifyLevel::Error,
            } => tracing::error!(target: "savesync::notify", %title, "{}", body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_order() {
        let (reporter, rx) = StatusReporter::new();
        reporter.status("uploading");
        reporter.notify_error("Save sync", "upload failed");

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events[0], StatusEvent::Status("uploading".into()));
        assert!(matches!(
            &events[1],
            StatusEvent::Notify { level: NotifyLevel::Error, body, .. } if body == "upload failed"
        ));
    }

    #[test]
    fn sending_without_receiver_does_not_panic() {
        let (reporter, rx) = StatusReporter::new();
        drop(rx);
        reporter.status("nobody home");
    }
}
