use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored save, as the server describes it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SaveRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub file_hash: String,
    #[serde(default)]
    pub storage_path: String,
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SaveListResponse {
    #[serde(default)]
    pub saves: Vec<SaveRecord>,
    #[serde(default)]
    pub total: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UploadResponse {
    pub save: SaveRecord,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
