// SyncController: orchestration of uploads, exit cleanup and restores

use crate::archive::{self, archive_name};
use crate::cancel::CancelToken;
use crate::config::SharedConfig;
use crate::error::SyncResult;
use crate::game_monitor::{ProcessTransition, detect_transition};
use crate::remote::{RemoteStore, SaveRecord};
use crate::status::StatusReporter;
use crate::util::format_size;

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::operations::{list_save_folders, replace_folder};
use super::pure::{folder_name, restore_destination, within_window};
use super::types::{LastUpload, RestoreCheck, SyncState, SyncTimings, TransitionOutcome};

const NOTIFY_TITLE: &str = "Save sync";

/// Owns [`SyncState`]. The watcher, debounce callbacks, the process monitor and
/// manual actions all go through these methods; none of them touch the state.
///
/// Remote calls are made with the state lock released.
pub struct SyncController {
    config: SharedConfig,
    remote: Arc<dyn RemoteStore>,
    status: StatusReporter,
    timings: SyncTimings,
    state: Mutex<SyncState>,
    shutdown: CancelToken,
    pending_restore: Mutex<Option<CancelToken>>,
}

impl SyncController {
    pub fn new(config: SharedConfig, remote: Arc<dyn RemoteStore>, status: StatusReporter) -> Self {
        Self {
            config,
            remote,
            status,
            timings: SyncTimings::default(),
            state: Mutex::new(SyncState::default()),
            shutdown: CancelToken::new(),
            pending_restore: Mutex::new(None),
        }
    }

    pub fn with_timings(mut self, timings: SyncTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn game_running(&self) -> bool {
        self.state.lock().game_running
    }

    pub fn last_uploaded(&self) -> Option<SaveRecord> {
        self.state.lock().last_upload.as_ref().map(|u| u.record.clone())
    }

    /// Token cancelled by [`SyncController::shutdown`]; long-running loops derive from it
    pub fn shutdown_token(&self) -> CancelToken {
        self.shutdown.clone()
    }

    /// Abort pending waits. In-flight requests finish on their own.
    pub fn shutdown(&self) {
        tracing::info!("sync controller shutting down");
        self.shutdown.cancel();
    }

    /// Archive one save folder and upload it
    pub fn upload_folder(&self, folder: &Path) -> SyncResult<SaveRecord> {
        let name = folder_name(folder);
        self.status.status(format!("Uploading {}", name));
        tracing::info!(folder = %folder.display(), "save folder changed, uploading");

        let data = archive::pack(folder).inspect_err(|e| {
            tracing::warn!(folder = %folder.display(), "packing failed: {}", e);
            self.status.status(format!("Packing failed: {}", e));
        })?;

        let size = data.len() as u64;
        tracing::debug!(size, "archive ready");
        self.status.status(format!("Uploading {} ({})", name, format_size(size)));

        let record = match self.remote.upload(&archive_name(&name), data) {
            Ok(record) => record,
            Err(e) => {
                if e.is_payload_too_large() {
                    tracing::error!(folder = %name, size, "server refused the archive size");
                }
                tracing::error!(folder = %name, "upload failed: {}", e);
                self.status.status(format!("Upload failed: {}", e));
                self.status
                    .notify_error(NOTIFY_TITLE, format!("Upload of {} failed: {}", name, e));
                return Err(e);
            }
        };

        if record.file_size != 0 && record.file_size != size {
            tracing::warn!(
                id = %record.id,
                stored = record.file_size,
                sent = size,
                "store reports a different size than uploaded"
            );
        }

        self.state.lock().last_upload = Some(LastUpload {
            record: record.clone(),
            at: Instant::now(),
        });

        let msg = format!("Backed up {}", name);
        tracing::info!(id = %record.id, "{}", msg);
        self.status.status(msg.clone());
        self.status.notify(NOTIFY_TITLE, msg);
        Ok(record)
    }

    /// Upload every save folder under the root, one at a time. Returns how many succeeded.
    pub fn manual_sync_all(&self) -> SyncResult<usize> {
        self.status.status("Syncing all saves...");
        let cfg = self.config.snapshot();

        let folders = list_save_folders(&cfg).inspect_err(|e| {
            tracing::error!("reading save directory failed: {}", e);
            self.status.status(format!("Reading save directory failed: {}", e));
        })?;

        let mut uploaded = 0;
        for (i, folder) in folders.iter().enumerate() {
            if self.upload_folder(folder).is_ok() {
                uploaded += 1;
            }
            // Don't hammer the store
            if i + 1 < folders.len() && !self.shutdown.sleep(self.timings.batch_pause) {
                tracing::info!("manual sync interrupted by shutdown");
                break;
            }
        }

        self.status
            .status(format!("Manual sync finished, uploaded {} save(s)", uploaded));
        Ok(uploaded)
    }

    /// Fetch the records the store knows about, newest first
    pub fn list_saves(&self, limit: usize) -> SyncResult<Vec<SaveRecord>> {
        self.status.status("Loading save list...");
        match self.remote.list(limit) {
            Ok(saves) => {
                self.status.status(format!("Loaded {} save(s)", saves.len()));
                Ok(saves)
            }
            Err(e) => {
                self.status.status(format!("Loading failed: {}", e));
                self.status.notify_error(NOTIFY_TITLE, e.to_string());
                Err(e)
            }
        }
    }

    pub fn check_health(&self) -> SyncResult<()> {
        self.remote.health().inspect_err(|e| {
            self.status.status(format!("Server unreachable: {}", e));
        })
    }

    /// Download `record` and replace the local folder with it
    pub fn restore_save(&self, record: &SaveRecord) -> SyncResult<PathBuf> {
        self.status.status("Downloading save...");
        match self.download_and_install(record) {
            Ok(dest) => {
                self.status.status("Restore complete");
                self.status
                    .notify(NOTIFY_TITLE, format!("Restored {}", record.file_name));
                Ok(dest)
            }
            Err(e) => {
                tracing::error!(id = %record.id, "restore failed: {}", e);
                self.status.status(format!("Restore failed: {}", e));
                self.status.notify_error(NOTIFY_TITLE, format!("Restore failed: {}", e));
                Err(e)
            }
        }
    }

    fn download_and_install(&self, record: &SaveRecord) -> SyncResult<PathBuf> {
        let cfg = self.config.snapshot();
        let dest = restore_destination(&cfg.save_path, &record.file_name)?;
        let data = self.remote.download(&record.id)?;

        let name = folder_name(&dest);
        self.state.lock().restored.insert(name.clone(), None);
        let result = replace_folder(&data, &dest);
        self.state.lock().restored.insert(name, Some(Instant::now()));
        result?;

        tracing::info!(id = %record.id, dest = %dest.display(), "save restored");
        Ok(dest)
    }

    /// Whether a watcher change on `folder` comes from a restore in progress or
    /// one that just finished, rather than from the game.
    pub fn is_restore_echo(&self, folder: &Path) -> bool {
        let window = self.timings.restore_echo_window;
        let mut state = self.state.lock();
        state
            .restored
            .retain(|_, done| done.is_none_or(|at| within_window(at, window)));
        state.restored.contains_key(&folder_name(folder))
    }

    /// Take back the last upload. Returns false when there was nothing to delete.
    pub fn delete_auto_save(&self) -> SyncResult<bool> {
        let Some(last) = self.state.lock().last_upload.clone() else {
            return Ok(false);
        };

        tracing::info!(
            file = %last.record.file_name,
            age_secs = last.at.elapsed().as_secs_f32(),
            "game exited right after an upload, deleting the exit auto-save"
        );

        if let Err(e) = self.remote.delete(&last.record.id) {
            tracing::warn!(id = %last.record.id, "deleting auto-save failed: {}", e);
            self.status.status(format!("Deleting auto-save failed: {}", e));
            return Err(e);
        }

        {
            let mut state = self.state.lock();
            // A newer upload may have landed while the delete was in flight
            if state
                .last_upload
                .as_ref()
                .is_some_and(|u| u.record.id == last.record.id)
            {
                state.last_upload = None;
            }
            state.last_cleared_id = Some(last.record.id.clone());
        }

        self.status.status("Deleted the auto-save written on game exit");
        Ok(true)
    }

    /// After a delay, pull the newest remote save unless it is the one we just
    /// uploaded or took back.
    pub fn check_for_newer_saves(&self, cancel: &CancelToken) -> SyncResult<RestoreCheck> {
        if !self.config.snapshot().auto_restore {
            return Ok(RestoreCheck::Disabled);
        }

        // Give the auto-save cleanup time to finish first
        if !cancel.sleep(self.timings.restore_delay) {
            tracing::debug!("newer-save check cancelled");
            return Ok(RestoreCheck::Cancelled);
        }
        if !self.config.snapshot().auto_restore {
            return Ok(RestoreCheck::Disabled);
        }

        self.status.status("Checking remote saves...");
        let latest = self.remote.latest().inspect_err(|e| {
            tracing::warn!("fetching latest remote save failed: {}", e);
            self.status.status(format!("Fetching remote saves failed: {}", e));
        })?;

        let already_known = {
            let state = self.state.lock();
            state
                .last_upload
                .as_ref()
                .is_some_and(|u| u.record.id == latest.id)
                || state.last_cleared_id.as_deref() == Some(latest.id.as_str())
        };
        if already_known {
            tracing::info!(id = %latest.id, "latest remote save is our own auto-save, skipping");
            self.status.status("No restore needed");
            return Ok(RestoreCheck::SameAsAutoSave);
        }

        if cancel.is_cancelled() {
            return Ok(RestoreCheck::Cancelled);
        }

        tracing::info!(file = %latest.file_name, timestamp = %latest.timestamp, "found remote save");
        self.status.status("Restoring remote save...");
        let dest = self.download_and_install(&latest).inspect_err(|e| {
            tracing::error!(id = %latest.id, "automatic restore failed: {}", e);
            self.status.status(format!("Automatic restore failed: {}", e));
        })?;

        let msg = format!("Restored remote save {}", folder_name(&dest));
        self.status.status(msg.clone());
        self.status.notify(NOTIFY_TITLE, msg);
        Ok(RestoreCheck::Restored(dest))
    }

    /// Feed one liveness sample. Edges update the state and, on exit, start the
    /// cleanup and restore tasks.
    pub fn observe_process(self: &Arc<Self>, running: bool) -> TransitionOutcome {
        let (transition, recent_upload) = {
            let mut state = self.state.lock();
            let transition = detect_transition(state.game_running, running);
            if transition.is_some() {
                state.game_running = running;
            }
            let recent = state
                .last_upload
                .as_ref()
                .is_some_and(|u| within_window(u.at, self.timings.auto_save_window));
            (transition, recent)
        };

        let mut outcome = TransitionOutcome {
            transition,
            ..TransitionOutcome::default()
        };

        match transition {
            None => {}
            Some(ProcessTransition::Started) => {
                tracing::info!("game started");
                self.status.status("Game running");
                // A restore queued by the previous exit is stale now
                if let Some(pending) = self.pending_restore.lock().take() {
                    pending.cancel();
                }
            }
            Some(ProcessTransition::Stopped) => {
                tracing::info!(recent_upload, "game stopped");
                self.status.status("Game not running");

                if recent_upload {
                    let this = Arc::clone(self);
                    outcome.cleanup = spawn_task("auto-save-cleanup", move || {
                        // Reported inside, the poll loop carries on either way
                        let _ = this.delete_auto_save();
                    });
                }

                if self.config.snapshot().auto_restore {
                    let token = self.shutdown.child();
                    if let Some(previous) = self.pending_restore.lock().replace(token.clone()) {
                        previous.cancel();
                    }
                    let this = Arc::clone(self);
                    outcome.restore_check = spawn_task("restore-check", move || {
                        match this.check_for_newer_saves(&token) {
                            Ok(result) => tracing::debug!(?result, "newer-save check done"),
                            Err(e) => tracing::debug!("newer-save check failed: {}", e),
                        }
                    });
                }
            }
        }

        outcome
    }

    #[cfg(test)]
    pub(crate) fn set_last_upload(&self, record: SaveRecord, at: Instant) {
        self.state.lock().last_upload = Some(LastUpload { record, at });
    }
}

fn spawn_task(name: &str, f: impl FnOnce() + Send + 'static) -> Option<JoinHandle<()>> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .inspect_err(|e| tracing::error!(task = name, "failed to spawn: {}", e))
        .ok()
}
