use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_SAVE_SUFFIX: &str = "__HonourMode";

/// Persisted client settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SyncConfig {
    /// Base URL of the save store, e.g. "https://saves.example.net/api"
    #[serde(default)]
    pub remote_url: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub save_path: PathBuf,
    /// Upload save folders when they change on disk
    #[serde(default = "default_true")]
    pub auto_sync: bool,
    /// Upload while the game is running. Carried for the settings shell, the
    /// watcher only consults `auto_sync`.
    #[serde(default = "default_true")]
    pub auto_upload: bool,
    /// Pull the newest remote save after the game exits
    #[serde(default)]
    pub auto_restore: bool,
    /// Folder name suffix marking the save mode we sync
    #[serde(default = "default_save_suffix")]
    pub save_suffix: String,
    /// Debounce each save folder separately instead of one shared window
    #[serde(default)]
    pub debounce_per_folder: bool,
    /// Overrides the per-OS game process names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_names: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

fn default_save_suffix() -> String {
    DEFAULT_SAVE_SUFFIX.to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            remote_url: String::new(),
            device_id: String::new(),
            save_path: PathBuf::new(),
            auto_sync: true,
            auto_upload: true,
            auto_restore: false,
            save_suffix: default_save_suffix(),
            debounce_per_folder: false,
            process_names: None,
        }
    }
}

impl SyncConfig {
    pub fn is_save_folder_name(&self, name: &str) -> bool {
        !self.save_suffix.is_empty() && name.ends_with(&self.save_suffix)
    }
}

/// Config handle shared by the controller, watcher and settings shell.
///
/// Readers take a fresh [`SyncConfig`] snapshot at every decision point, so a
/// toggle flipped by the shell applies to the very next event.
#[derive(Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<SyncConfig>>,
}

impl SharedConfig {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn snapshot(&self) -> SyncConfig {
        self.inner.read().clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut SyncConfig)) {
        f(&mut self.inner.write());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: SyncConfig = serde_json::from_str(r#"{"remote_url": "http://x"}"#).unwrap();
        assert_eq!(cfg.remote_url, "http://x");
        assert!(cfg.auto_sync);
        assert!(cfg.auto_upload);
        assert!(!cfg.auto_restore);
        assert_eq!(cfg.save_suffix, DEFAULT_SAVE_SUFFIX);
    }

    #[test]
    fn suffix_match() {
        let cfg = SyncConfig::default();
        assert!(cfg.is_save_folder_name("a1b2c3__HonourMode"));
        assert!(!cfg.is_save_folder_name("a1b2c3"));
        assert!(!cfg.is_save_folder_name("__HonourMode_backup"));
    }

    #[test]
    fn snapshot_sees_updates() {
        let shared = SharedConfig::new(SyncConfig::default());
        let before = shared.snapshot();
        shared.update(|c| c.auto_sync = false);
        assert!(before.auto_sync);
        assert!(!shared.snapshot().auto_sync);
    }
}
