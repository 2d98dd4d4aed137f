//! Polls the game process and reports started/stopped edges to the controller

use crate::cancel::CancelToken;
use crate::process::ProcessProbe;
use crate::save_sync::SyncController;

use std::sync::Arc;
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessTransition {
    Started,
    Stopped,
}

/// Edge between two liveness samples, None when nothing changed
pub fn detect_transition(previous: bool, current: bool) -> Option<ProcessTransition> {
    match (previous, current) {
        (false, true) => Some(ProcessTransition::Started),
        (true, false) => Some(ProcessTransition::Stopped),
        _ => None,
    }
}

pub struct ProcessMonitor {
    probe: Box<dyn ProcessProbe>,
    candidates: Vec<String>,
    interval: Duration,
    controller: Arc<SyncController>,
}

impl ProcessMonitor {
    pub fn new(
        probe: Box<dyn ProcessProbe>,
        candidates: Vec<String>,
        controller: Arc<SyncController>,
    ) -> Self {
        Self {
            probe,
            candidates,
            interval: POLL_INTERVAL,
            controller,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// One poll. The controller decides under its own lock whether this is an edge.
    pub fn poll_once(&self) {
        let running = self.probe.is_running(&self.candidates);
        // Spawned cleanup/restore tasks are detached, the poll loop never waits on them
        let _ = self.controller.observe_process(running);
    }

    /// Poll until `cancel` fires
    pub fn run(&self, cancel: &CancelToken) {
        tracing::info!(candidates = ?self.candidates, "watching game process");
        while cancel.sleep(self.interval) {
            self.poll_once();
        }
        tracing::debug!("process monitor stopped");
    }
}
