use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Created,
    Modified,
    Removed,
    Other,
}

/// One path touched by a filesystem notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not a create, data write or folder removal
    Kind,
    /// Candidate folder is not a direct child of the save root
    OutsideRoot,
    /// Candidate folder lacks the save suffix
    NotSaveFolder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDecision {
    Ignore(IgnoreReason),
    /// Something inside a save folder was written. `created` asks for the
    /// folder to be (re)added to the watch set.
    Change { folder: PathBuf, created: bool },
    /// A save folder itself appeared under the root
    NewFolder(PathBuf),
    /// A save folder directly under the root went away; its watch died with it
    FolderRemoved(PathBuf),
}
