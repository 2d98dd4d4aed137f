//! Remote save store
//!
//! The controller only talks to [`RemoteStore`]; [`HttpRemoteStore`] is the
//! production implementation against the save server's REST API.

mod http;
mod types;

pub use http::HttpRemoteStore;
pub use types::SaveRecord;

use crate::error::{SyncError, SyncResult};

pub const DEFAULT_LIST_LIMIT: usize = 100;

pub trait RemoteStore: Send + Sync {
    /// Store `data` under the logical file name `name`
    fn upload(&self, name: &str, data: Vec<u8>) -> SyncResult<SaveRecord>;

    /// Most recent records first
    fn list(&self, limit: usize) -> SyncResult<Vec<SaveRecord>>;

    fn download(&self, id: &str) -> SyncResult<Vec<u8>>;

    fn delete(&self, id: &str) -> SyncResult<()>;

    fn health(&self) -> SyncResult<()>;

    /// The newest record in the store
    fn latest(&self) -> SyncResult<SaveRecord> {
        self.list(1)?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NotFound("no saves in the remote store".to_string()))
    }
}
