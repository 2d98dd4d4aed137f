use super::types::{ErrorResponse, SaveListResponse, SaveRecord, UploadResponse};
use super::RemoteStore;
use crate::error::{SyncError, SyncResult};

use chrono::{SecondsFormat, Utc};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response, multipart};
use std::time::Duration;

const DEVICE_HEADER: &str = "X-Device-ID";
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);
const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for the save server
pub struct HttpRemoteStore {
    base_url: String,
    device_id: String,
    client: Client,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, device_id: &str) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .user_agent(concat!("savesync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            device_id: device_id.to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into a [`SyncError`]
    fn check(response: Response, ok: &[StatusCode], sent_bytes: Option<u64>) -> SyncResult<Response> {
        let status = response.status();
        if ok.contains(&status) {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        if let Some(size) = sent_bytes
            && (status == StatusCode::PAYLOAD_TOO_LARGE || body.contains("Request Entity Too Large"))
        {
            return Err(SyncError::PayloadTooLarge { size });
        }

        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) if !err.error.is_empty() => match err.message {
                Some(detail) if !detail.is_empty() => format!("{}: {}", err.error, detail),
                _ => err.error,
            },
            _ => body.trim().to_string(),
        };
        Err(SyncError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

impl RemoteStore for HttpRemoteStore {
    fn upload(&self, name: &str, data: Vec<u8>) -> SyncResult<SaveRecord> {
        let size = data.len() as u64;
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(data).file_name(name.to_string()))
            .text("device_id", self.device_id.clone())
            .text("timestamp", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        let response = self
            .client
            .post(self.url("/games/upload"))
            .header(DEVICE_HEADER, &self.device_id)
            .multipart(form)
            .send()?;
        let response = Self::check(response, &[StatusCode::OK, StatusCode::CREATED], Some(size))?;

        let body = response.text()?;
        let parsed: UploadResponse = serde_json::from_str(&body)?;
        Ok(parsed.save)
    }

    fn list(&self, limit: usize) -> SyncResult<Vec<SaveRecord>> {
        let response = self
            .client
            .get(self.url("/games/list"))
            .query(&[("limit", limit)])
            .header(DEVICE_HEADER, &self.device_id)
            .timeout(LIST_TIMEOUT)
            .send()?;
        let response = Self::check(response, &[StatusCode::OK], None)?;

        let body = response.text()?;
        let parsed: SaveListResponse = serde_json::from_str(&body)?;
        Ok(parsed.saves)
    }

    fn download(&self, id: &str) -> SyncResult<Vec<u8>> {
        let response = self
            .client
            .get(self.url(&format!("/games/{}/download", id)))
            .header(DEVICE_HEADER, &self.device_id)
            .send()?;
        let response = Self::check(response, &[StatusCode::OK], None)?;
        Ok(response.bytes()?.to_vec())
    }

    fn delete(&self, id: &str) -> SyncResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/games/{}", id)))
            .header(DEVICE_HEADER, &self.device_id)
            .send()?;
        Self::check(response, &[StatusCode::OK, StatusCode::NO_CONTENT], None)?;
        Ok(())
    }

    fn health(&self) -> SyncResult<()> {
        let response = self
            .client
            .get(self.url("/health"))
            .header(DEVICE_HEADER, &self.device_id)
            .send()?;
        Self::check(response, &[StatusCode::OK], None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const RECORD: &str = r#"{
        "id": "s1",
        "timestamp": "2024-05-01T12:30:00Z",
        "file_hash": "abc",
        "storage_path": "/data/s1.zip",
        "file_name": "f00d__HonourMode.zip",
        "file_size": 4,
        "device_id": "dev-1"
    }"#;

    fn store(server: &mockito::Server) -> HttpRemoteStore {
        HttpRemoteStore::new(&format!("{}/", server.url()), "dev-1").unwrap()
    }

    #[test]
    fn upload_sends_multipart_with_device_header() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/games/upload")
            .match_header("x-device-id", "dev-1")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data; boundary=.*".into()),
            )
            .match_body(Matcher::Regex("f00d__HonourMode.zip".into()))
            .with_status(201)
            .with_body(format!(r#"{{"save": {}, "message": "ok"}}"#, RECORD))
            .create();

        let record = store(&server)
            .upload("f00d__HonourMode.zip", b"PK..".to_vec())
            .unwrap();
        assert_eq!(record.id, "s1");
        mock.assert();
    }

    #[test]
    fn upload_413_is_payload_too_large() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/games/upload")
            .with_status(413)
            .with_body("<html>413 Request Entity Too Large</html>")
            .create();

        let err = store(&server).upload("big.zip", vec![0; 2048]).unwrap_err();
        assert!(matches!(err, SyncError::PayloadTooLarge { size: 2048 }));
    }

    #[test]
    fn server_error_message_is_extracted() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/games/upload")
            .with_status(500)
            .with_body(r#"{"error": "disk full"}"#)
            .create();

        let err = store(&server).upload("a.zip", vec![1]).unwrap_err();
        match err {
            SyncError::Remote { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "disk full");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn list_passes_limit_and_parses() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/games/list")
            .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_body(format!(r#"{{"saves": [{}], "total": 1}}"#, RECORD))
            .create();

        let saves = store(&server).list(5).unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].file_name, "f00d__HonourMode.zip");
    }

    #[test]
    fn latest_on_empty_store_is_not_found() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/games/list")
            .match_query(Matcher::UrlEncoded("limit".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"saves": [], "total": 0}"#)
            .create();

        let err = store(&server).latest().unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[test]
    fn download_returns_raw_bytes() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/games/s1/download")
            .with_status(200)
            .with_body([1u8, 2, 3, 4])
            .create();

        assert_eq!(store(&server).download("s1").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn delete_accepts_no_content() {
        let mut server = mockito::Server::new();
        let mock = server.mock("DELETE", "/games/s1").with_status(204).create();
        store(&server).delete("s1").unwrap();
        mock.assert();
    }

    #[test]
    fn delete_missing_is_remote_error() {
        let mut server = mockito::Server::new();
        server
            .mock("DELETE", "/games/gone")
            .with_status(404)
            .with_body("no such save")
            .create();

        let err = store(&server).delete("gone").unwrap_err();
        assert!(matches!(err, SyncError::Remote { status: 404, .. }));
    }

    #[test]
    fn health_checks_status() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/health").with_status(503).create();
        assert!(store(&server).health().is_err());
    }
}
