//! Test doubles shared by unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::config::ProxyConfig;
use crate::error::{Error, Result};
use crate::providers::RemoteStorage;
use crate::server::state::AppState;
use crate::storage::StatusStore;
use crate::types::{JobId, JobStatus};

/// How the fake provider answers `upload_file`
#[derive(Clone, Copy)]
pub enum UploadBehavior {
    Succeed,
    Fail,
    Panic,
    Slow(Duration),
}

/// In-memory provider recording what the worker did
pub struct FakeRemote {
    pub behavior: UploadBehavior,
    pub store: Option<StatusStore>,
    pub observed: Mutex<Vec<(Option<JobStatus>, bool)>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new(behavior: UploadBehavior) -> Self {
        Self {
            behavior,
            store: None,
            observed: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Also record the job status visible while uploading
    pub fn watching(behavior: UploadBehavior, store: StatusStore) -> Self {
        Self {
            store: Some(store),
            ..Self::new(behavior)
        }
    }

    fn record_call(&self, call: String) {
        self.calls.lock().push(call);
    }
}

/// Default configuration with both storage directories inside `dir`
pub fn test_config(dir: &TempDir) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.storage.status_dir = dir.path().join("status");
    config.storage.staging_dir = dir.path().join("staging");
    config
}

/// Application state rooted in `dir`, backed by `remote`
pub async fn test_state(dir: &TempDir, remote: Arc<FakeRemote>) -> AppState {
    AppState::with_remote(test_config(dir), remote).await.unwrap()
}

fn job_id_from_path(path: &Path) -> Option<JobId> {
    let name = path.file_name()?.to_str()?;
    name.get(..36)?.parse().ok()
}

#[async_trait]
impl RemoteStorage for FakeRemote {
    async fn upload_file(&self, path: &Path, file_name: &str) -> Result<Value> {
        self.record_call(format!("upload_file:{}", file_name));

        if let Some(store) = &self.store {
            let status = match job_id_from_path(path) {
                Some(id) => store.read(&id).await?.map(|r| r.status),
                None => None,
            };
            self.observed.lock().push((status, path.exists()));
        }

        match self.behavior {
            UploadBehavior::Succeed => Ok(json!({ "result": true, "code": 200 })),
            UploadBehavior::Fail => Err(Error::remote("HTTP 500: s3cr3t internal trace")),
            UploadBehavior::Panic => panic!("provider bug"),
            UploadBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(json!({ "result": true }))
            }
        }
    }

    async fn add_torrent(&self, magnet: &str) -> Result<Value> {
        self.record_call(format!("add_torrent:{}", magnet));
        Ok(json!({ "result": true, "magnet": magnet }))
    }

    async fn list_contents(&self) -> Result<Value> {
        self.record_call("list_contents".to_string());
        Ok(json!({ "folders": [], "files": [] }))
    }

    async fn get_file(&self, file_id: &str) -> Result<Value> {
        self.record_call(format!("get_file:{}", file_id));
        Ok(json!({ "id": file_id }))
    }

    async fn delete_file(&self, file_id: &str) -> Result<Value> {
        self.record_call(format!("delete_file:{}", file_id));
        Ok(json!({ "result": true }))
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<Value> {
        self.record_call(format!("delete_folder:{}", folder_id));
        Ok(json!({ "result": true }))
    }

    fn name(&self) -> &str {
        "fake"
    }
}
