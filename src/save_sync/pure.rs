// Decisions with no side effects

use crate::archive::strip_archive_extension;
use crate::error::{SyncError, SyncResult};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Local folder a record restores into. Names that could leave `root` are refused.
pub fn restore_destination(root: &Path, file_name: &str) -> SyncResult<PathBuf> {
    let folder = strip_archive_extension(file_name);
    let unsafe_name = folder.is_empty()
        || folder == "."
        || folder == ".."
        || folder.contains('/')
        || folder.contains('\\');
    if unsafe_name {
        return Err(SyncError::InvalidSaveName(file_name.to_string()));
    }
    Ok(root.join(folder))
}

pub fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.display().to_string())
}

pub fn within_window(at: Instant, window: Duration) -> bool {
    at.elapsed() < window
}
