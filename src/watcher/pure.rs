// Event mapping and classification, no filesystem access

use crate::config::SyncConfig;

use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};
use std::path::{Component, Path, PathBuf};

use super::types::{EventDecision, FsEvent, FsEventKind, IgnoreReason};

/// Flatten a notify event into one [`FsEvent`] per path
pub fn fs_events(event: &notify::Event) -> Vec<FsEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => FsEventKind::Created,
        // A file moved into a watched folder counts as created
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => FsEventKind::Created,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => FsEventKind::Modified,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            FsEventKind::Removed
        }
        _ => FsEventKind::Other,
    };
    event
        .paths
        .iter()
        .map(|p| FsEvent::new(p.clone(), kind))
        .collect()
}

/// Resolve `.` and `..` lexically. Symlinks are not followed.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn is_root(roots: &[PathBuf], dir: &Path) -> bool {
    roots.iter().any(|r| r == dir)
}

/// Decide what a single event means for the save root.
///
/// `roots` are the accepted spellings of the save root (lexical first, then
/// canonical); returned folders are always joined onto `roots[0]` so the same
/// folder gets the same path whichever spelling the backend reported.
pub fn classify_event(roots: &[PathBuf], cfg: &SyncConfig, event: &FsEvent) -> EventDecision {
    let Some(root) = roots.first() else {
        return EventDecision::Ignore(IgnoreReason::OutsideRoot);
    };
    if event.kind == FsEventKind::Other {
        return EventDecision::Ignore(IgnoreReason::Kind);
    }

    let path = normalize_path(&event.path);

    // The folder itself was created or removed directly under the root
    if let Some(parent) = path.parent()
        && is_root(roots, parent)
        && let Some(name) = path.file_name()
        && cfg.is_save_folder_name(&name.to_string_lossy())
    {
        match event.kind {
            FsEventKind::Created => return EventDecision::NewFolder(root.join(name)),
            FsEventKind::Removed => return EventDecision::FolderRemoved(root.join(name)),
            _ => {}
        }
    }

    // Deleting a save file is not a reason to upload
    if event.kind == FsEventKind::Removed {
        return EventDecision::Ignore(IgnoreReason::Kind);
    }

    let Some(folder) = path.parent() else {
        return EventDecision::Ignore(IgnoreReason::OutsideRoot);
    };
    let (Some(parent), Some(name)) = (folder.parent(), folder.file_name()) else {
        return EventDecision::Ignore(IgnoreReason::OutsideRoot);
    };
    if !is_root(roots, parent) {
        return EventDecision::Ignore(IgnoreReason::OutsideRoot);
    }
    if !cfg.is_save_folder_name(&name.to_string_lossy()) {
        return EventDecision::Ignore(IgnoreReason::NotSaveFolder);
    }

    EventDecision::Change {
        folder: root.join(name),
        created: event.kind == FsEventKind::Created,
    }
}
