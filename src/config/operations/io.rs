use crate::config::types::SyncConfig;
use crate::paths::{PATH_APP_DATA, default_save_path};

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn load_cfg() -> SyncConfig {
    load_cfg_from(&PATH_APP_DATA.join("config.json"))
}

pub fn load_cfg_from(path: &Path) -> SyncConfig {
    if let Ok(file) = File::open(path) {
        match serde_json::from_reader::<_, SyncConfig>(BufReader::new(file)) {
            Ok(config) => return config,
            Err(e) => tracing::warn!(path = %path.display(), "ignoring unreadable config: {}", e),
        }
    }

    // Return default settings if file doesn't exist or has error
    SyncConfig::default()
}

pub fn save_cfg(config: &SyncConfig) -> Result<(), Box<dyn Error>> {
    save_cfg_to(config, &PATH_APP_DATA.join("config.json"))
}

pub fn save_cfg_to(config: &SyncConfig, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}

/// Fill in the save path and device id on first start.
/// Returns true when the config changed and should be written back.
pub fn init_first_run(config: &mut SyncConfig) -> bool {
    let mut changed = false;
    if config.save_path.as_os_str().is_empty() {
        config.save_path = default_save_path();
        changed = true;
    }
    if config.device_id.is_empty() {
        config.device_id = generate_device_id();
        changed = true;
    }
    changed
}

fn generate_device_id() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}-{}", host, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut cfg = SyncConfig::default();
        cfg.remote_url = "http://saves.local".into();
        cfg.auto_restore = true;
        save_cfg_to(&cfg, &path).unwrap();

        assert_eq!(load_cfg_from(&path), cfg);
    }

    #[test]
    fn garbage_config_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_cfg_from(&path), SyncConfig::default());
    }

    #[test]
    fn first_run_generates_device_id_once() {
        let mut cfg = SyncConfig::default();
        assert!(init_first_run(&mut cfg));
        assert!(!cfg.device_id.is_empty());
        assert!(!cfg.save_path.as_os_str().is_empty());

        let id = cfg.device_id.clone();
        assert!(!init_first_run(&mut cfg));
        assert_eq!(cfg.device_id, id);
    }
}
