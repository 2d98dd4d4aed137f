// SaveWatcher: keeps the watch set current and routes events to the trigger

use crate::cancel::CancelToken;
use crate::config::SharedConfig;
use crate::error::SyncResult;
use crate::save_sync::list_save_folders;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::time::Duration;

use super::operations::{UploadTrigger, WatchSet};
use super::pure::{classify_event, fs_events, normalize_path};
use super::types::{EventDecision, FsEvent};

/// How often an idle loop looks at its cancel token
const CANCEL_CHECK: Duration = Duration::from_millis(500);

pub type NotifyReceiver = Receiver<notify::Result<notify::Event>>;

pub struct SaveWatcher<W, T> {
    roots: Vec<PathBuf>,
    config: SharedConfig,
    watch: W,
    watched: HashSet<PathBuf>,
    trigger: T,
}

impl<T: UploadTrigger> SaveWatcher<notify::RecommendedWatcher, T> {
    /// Create the notify backend, watch the root and every existing save folder
    pub fn start(config: SharedConfig, trigger: T) -> SyncResult<(Self, NotifyReceiver)> {
        let (tx, rx) = channel();
        let backend = notify::recommended_watcher(tx)?;
        let mut watcher = SaveWatcher::new(config, backend, trigger);
        watcher.watch_existing()?;
        Ok((watcher, rx))
    }
}

impl<W: WatchSet, T: UploadTrigger> SaveWatcher<W, T> {
    pub fn new(config: SharedConfig, watch: W, trigger: T) -> Self {
        let roots = root_spellings(&config.snapshot().save_path);
        Self {
            roots,
            config,
            watch,
            watched: HashSet::new(),
            trigger,
        }
    }

    pub fn root(&self) -> &Path {
        &self.roots[0]
    }

    pub fn watched(&self) -> &HashSet<PathBuf> {
        &self.watched
    }

    /// Watch the root itself plus each save folder already on disk.
    /// Returns how many save folders are watched afterwards.
    pub fn watch_existing(&mut self) -> SyncResult<usize> {
        let root = self.root().to_path_buf();
        if !self.watched.contains(&root) {
            self.watch.add(&root)?;
            self.watched.insert(root.clone());
        }

        let cfg = self.config.snapshot();
        for folder in list_save_folders(&cfg)? {
            self.add_folder(&folder);
        }

        let count = self.watched.len() - 1;
        tracing::info!(root = %root.display(), folders = count, "watching save directory");
        Ok(count)
    }

    fn add_folder(&mut self, folder: &Path) {
        if self.watched.contains(folder) {
            return;
        }
        match self.watch.add(folder) {
            Ok(()) => {
                tracing::debug!(folder = %folder.display(), "watching save folder");
                self.watched.insert(folder.to_path_buf());
            }
            Err(e) => tracing::warn!(folder = %folder.display(), "cannot watch save folder: {}", e),
        }
    }

    /// Drop a folder whose directory was removed. The backend watch died with the
    /// inode, so a recreated folder must be added again.
    fn forget_folder(&mut self, folder: &Path) {
        if !self.watched.remove(folder) {
            return;
        }
        // Usually fails, the backend already let go of the deleted inode
        if let Err(e) = self.watch.remove(folder) {
            tracing::trace!(folder = %folder.display(), "unwatch after removal: {}", e);
        }
        tracing::debug!(folder = %folder.display(), "save folder removed");
    }

    /// Apply one event: extend the watch set and request an upload when due
    pub fn handle_event(&mut self, event: &FsEvent) -> EventDecision {
        let cfg = self.config.snapshot();
        let decision = classify_event(&self.roots, &cfg, event);

        let folder = match &decision {
            EventDecision::Ignore(reason) => {
                tracing::trace!(path = %event.path.display(), ?reason, "event ignored");
                return decision;
            }
            EventDecision::NewFolder(folder) => {
                if !folder.is_dir() {
                    tracing::trace!(path = %folder.display(), "suffixed entry is not a directory");
                    return decision;
                }
                tracing::info!(folder = %folder.display(), "new save folder");
                // Same path may be a recreated directory whose removal we never saw
                self.forget_folder(folder);
                self.add_folder(folder);
                folder.clone()
            }
            EventDecision::FolderRemoved(folder) => {
                self.forget_folder(folder);
                return decision;
            }
            EventDecision::Change { folder, created } => {
                if *created {
                    self.add_folder(folder);
                }
                folder.clone()
            }
        };

        if cfg.auto_sync {
            self.trigger.trigger(folder);
        } else {
            tracing::trace!(folder = %folder.display(), "auto sync off, change not uploaded");
        }
        decision
    }

    /// Process notifications until the channel closes or `cancel` fires.
    /// Backend errors are logged and the loop keeps going.
    pub fn run(&mut self, rx: &NotifyReceiver, cancel: &CancelToken) {
        while !cancel.is_cancelled() {
            match rx.recv_timeout(CANCEL_CHECK) {
                Ok(Ok(event)) => {
                    for fs_event in fs_events(&event) {
                        self.handle_event(&fs_event);
                    }
                }
                Ok(Err(e)) => tracing::warn!("watch error: {}", e),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("notification channel closed");
                    break;
                }
            }
        }
        tracing::debug!("watch loop finished");
    }
}

/// The configured root, normalized, then its canonical form when that differs
fn root_spellings(root: &Path) -> Vec<PathBuf> {
    let lexical = normalize_path(root);
    let mut roots = vec![lexical.clone()];
    if let Ok(canonical) = fs::canonicalize(root)
        && canonical != lexical
    {
        roots.push(canonical);
    }
    roots
}
