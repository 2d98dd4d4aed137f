use crate::game_monitor::ProcessTransition;
use crate::remote::SaveRecord;

use std::collections::HashMap;
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// The most recent successful upload and when it finished
#[derive(Debug, Clone)]
pub struct LastUpload {
    pub record: SaveRecord,
    pub at: Instant,
}

/// Everything the controller remembers between events. Guarded as one unit.
#[derive(Debug, Default)]
pub(crate) struct SyncState {
    pub game_running: bool,
    pub last_upload: Option<LastUpload>,
    /// Id of the upload most recently taken back by the auto-save cleanup
    pub last_cleared_id: Option<String>,
    /// Folder names written by a restore: None while unpacking, then when it finished
    pub restored: HashMap<String, Option<Instant>>,
}

#[derive(Debug, Clone, Copy)]
pub struct SyncTimings {
    /// An upload this recent when the game exits is the game's own exit save
    pub auto_save_window: Duration,
    /// Wait before looking for a newer remote save after exit
    pub restore_delay: Duration,
    /// Pause between uploads of a manual batch
    pub batch_pause: Duration,
    /// Watcher events for a folder this soon after its restore are our own writes
    pub restore_echo_window: Duration,
}

impl Default for SyncTimings {
    fn default() -> Self {
        Self {
            auto_save_window: Duration::from_secs(10),
            restore_delay: Duration::from_secs(15),
            batch_pause: Duration::from_millis(500),
            restore_echo_window: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreCheck {
    /// auto_restore is off, nothing was fetched
    Disabled,
    /// Aborted during the wait (game restarted or shutdown)
    Cancelled,
    /// The newest remote save is the one we uploaded or just took back
    SameAsAutoSave,
    Restored(PathBuf),
}

/// What a liveness sample set in motion. Handles are for callers who want to
/// wait; dropping them leaves the tasks running detached.
#[derive(Default)]
pub struct TransitionOutcome {
    pub transition: Option<ProcessTransition>,
    pub cleanup: Option<JoinHandle<()>>,
    pub restore_check: Option<JoinHandle<()>>,
}

impl TransitionOutcome {
    pub fn join(self) {
        for handle in [self.cleanup, self.restore_check].into_iter().flatten() {
            let _ = handle.join();
        }
    }
}
