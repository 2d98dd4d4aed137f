// In-memory remote store for controller tests

use crate::error::{SyncError, SyncResult};
use crate::remote::{RemoteStore, SaveRecord};

use chrono::Utc;
use parking_lot::Mutex;

#[derive(Default)]
struct FakeState {
    /// Newest first, like the real list endpoint
    records: Vec<(SaveRecord, Vec<u8>)>,
    calls: Vec<String>,
    upload_status: Option<u16>,
    delete_fails: bool,
    /// Store keeps listing deleted records (lagging index)
    keep_on_delete: bool,
    next_id: u32,
}

#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
}

pub fn record(id: &str, file_name: &str) -> SaveRecord {
    SaveRecord {
        id: id.to_string(),
        timestamp: Utc::now(),
        file_hash: String::new(),
        storage_path: format!("/store/{}", id),
        file_name: file_name.to_string(),
        file_size: 0,
        device_id: "test-device".to_string(),
        game_time: None,
        notes: None,
    }
}

impl FakeRemote {
    /// Push a record that becomes the newest
    pub fn with_record(self, record: SaveRecord, data: Vec<u8>) -> Self {
        self.state.lock().records.insert(0, (record, data));
        self
    }

    pub fn fail_uploads(&self, status: u16) {
        self.state.lock().upload_status = Some(status);
    }

    pub fn fail_deletes(&self) {
        self.state.lock().delete_fails = true;
    }

    pub fn keep_on_delete(&self) {
        self.state.lock().keep_on_delete = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.state.lock().records.iter().map(|(r, _)| r.id.clone()).collect()
    }
}

impl RemoteStore for FakeRemote {
    fn upload(&self, name: &str, data: Vec<u8>) -> SyncResult<SaveRecord> {
        let mut state = self.state.lock();
        state.calls.push(format!("upload:{}", name));
        if let Some(status) = state.upload_status {
            return Err(SyncError::Remote {
                status,
                message: "rejected".to_string(),
            });
        }
        state.next_id += 1;
        let mut rec = record(&format!("up{}", state.next_id), name);
        rec.file_size = data.len() as u64;
        state.records.insert(0, (rec.clone(), data));
        Ok(rec)
    }

    fn list(&self, limit: usize) -> SyncResult<Vec<SaveRecord>> {
        let mut state = self.state.lock();
        state.calls.push(format!("list:{}", limit));
        Ok(state.records.iter().take(limit).map(|(r, _)| r.clone()).collect())
    }

    fn download(&self, id: &str) -> SyncResult<Vec<u8>> {
        let mut state = self.state.lock();
        state.calls.push(format!("download:{}", id));
        state
            .records
            .iter()
            .find(|(r, _)| r.id == id)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> SyncResult<()> {
        let mut state = self.state.lock();
        state.calls.push(format!("delete:{}", id));
        if state.delete_fails {
            return Err(SyncError::Remote {
                status: 500,
                message: "delete failed".to_string(),
            });
        }
        if !state.keep_on_delete {
            state.records.retain(|(r, _)| r.id != id);
        }
        Ok(())
    }

    fn health(&self) -> SyncResult<()> {
        self.state.lock().calls.push("health".to_string());
        Ok(())
    }
}
