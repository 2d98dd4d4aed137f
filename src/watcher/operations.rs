// Seams between the event loop and the outside world

use crate::config::SharedConfig;
use crate::debounce::Debouncer;
use crate::error::SyncResult;
use crate::save_sync::SyncController;

use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Anything that can extend the set of watched directories at runtime
pub trait WatchSet {
    fn add(&mut self, path: &Path) -> SyncResult<()>;
    fn remove(&mut self, path: &Path) -> SyncResult<()>;
}

impl WatchSet for notify::RecommendedWatcher {
    fn add(&mut self, path: &Path) -> SyncResult<()> {
        // Backends used here do not recurse reliably, every folder is added by hand
        self.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> SyncResult<()> {
        self.unwatch(path)?;
        Ok(())
    }
}

/// Receives folders that should be uploaded
pub trait UploadTrigger: Send {
    fn trigger(&self, folder: PathBuf);
}

/// Debounces upload requests and forwards them to the controller.
///
/// With `debounce_per_folder` off, every folder shares one key, so a burst across
/// several folders uploads only the last one. With it on, each folder has its own.
pub struct DebouncedUploader {
    debouncer: Debouncer<Option<PathBuf>>,
    controller: Arc<SyncController>,
    config: SharedConfig,
}

impl DebouncedUploader {
    pub fn new(controller: Arc<SyncController>, delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            config: controller.config().clone(),
            controller,
        }
    }
}

impl UploadTrigger for DebouncedUploader {
    fn trigger(&self, folder: PathBuf) {
        if self.controller.is_restore_echo(&folder) {
            tracing::debug!(folder = %folder.display(), "change made by a restore, not uploaded");
            return;
        }
        let key = self
            .config
            .snapshot()
            .debounce_per_folder
            .then(|| folder.clone());
        let controller = Arc::clone(&self.controller);
        tracing::debug!(folder = %folder.display(), "upload scheduled");
        self.debouncer.schedule(key, move || {
            // Failures are reported by the controller itself
            let _ = controller.upload_folder(&folder);
        });
    }
}
