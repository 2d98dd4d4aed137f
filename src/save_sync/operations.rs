// Filesystem side effects for the controller

use crate::archive;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

use std::fs;
use std::path::{Path, PathBuf};

/// Immediate subdirectories of the save root carrying the save suffix
pub fn list_save_folders(cfg: &SyncConfig) -> SyncResult<Vec<PathBuf>> {
    let root = &cfg.save_path;
    let entries = fs::read_dir(root).map_err(|e| SyncError::io("read", root, e))?;

    let mut folders: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| cfg.is_save_folder_name(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    folders.sort();
    Ok(folders)
}

/// Replace `dest` with the archive contents. Destructive and not atomic: a failed
/// unpack leaves whatever was written so far.
pub fn replace_folder(data: &[u8], dest: &Path) -> SyncResult<()> {
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| SyncError::io("remove", dest, e))?;
    }
    archive::unpack(data, dest)
}
