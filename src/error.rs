//! Error taxonomy for the sync subsystem
//!
//! Every unit of work (upload, restore, cleanup, watch loop) returns a
//! [`SyncResult`] and converts failures into a status report at its boundary.

use std::path::PathBuf;

use crate::util::format_size;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Local filesystem read/write/remove failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The downloaded blob is not a readable archive
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// Non-success response from the remote store
    #[error("server error (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// The store rejected the upload body as too large
    #[error(
        "archive too large ({}), raise the server request body limit (e.g. nginx client_max_body_size)",
        format_size(*size)
    )]
    PayloadTooLarge { size: u64 },

    /// An empty result where a record was expected
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport-level failure talking to the remote store
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed response body from the remote store
    #[error("invalid server response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Filesystem notification backend failure
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// A record file name that would escape the save root
    #[error("refusing to restore save with unsafe name: {0}")]
    InvalidSaveName(String),
}

impl SyncError {
    /// Wrap an io error with the path it concerns
    pub fn io(action: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            context: format!("{} {}", action, path.into().display()),
            source,
        }
    }

    /// Whether retrying the same request could never succeed without user action
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self, SyncError::PayloadTooLarge { .. })
    }
}

impl From<zip::result::ZipError> for SyncError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(source) => SyncError::Io {
                context: "archive i/o".to_string(),
                source,
            },
            other => SyncError::CorruptArchive(other.to_string()),
        }
    }
}

impl From<walkdir::Error> for SyncError {
    fn from(e: walkdir::Error) -> Self {
        let context = match e.path() {
            Some(p) => format!("walk {}", p.display()),
            None => "walk".to_string(),
        };
        let source = e
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        SyncError::Io { context, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_too_large_message_is_actionable() {
        let err = SyncError::PayloadTooLarge { size: 3 * 1024 * 1024 };
        let msg = err.to_string();
        assert!(msg.contains("3.0 MB"));
        assert!(msg.contains("client_max_body_size"));
        assert!(err.is_payload_too_large());
    }

    #[test]
    fn zip_io_errors_stay_io() {
        let err: SyncError =
            zip::result::ZipError::Io(std::io::Error::other("disk gone")).into();
        assert!(matches!(err, SyncError::Io { .. }));

        let err: SyncError = zip::result::ZipError::InvalidArchive("bad header".into()).into();
        assert!(matches!(err, SyncError::CorruptArchive(_)));
    }
}
