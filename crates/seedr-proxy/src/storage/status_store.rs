//! File-backed job status store
//!
//! One JSON document per job, named `<job_id>.json`. Writes replace the whole
//! document. There is no locking: each key has a single writer, the worker of
//! that job, and distinct keys live in distinct files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{JobId, JobRecord};

/// Durable mapping from job id to job record
#[derive(Debug, Clone)]
pub struct StatusStore {
    dir: PathBuf,
}

impl StatusStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::status_store(format!(
                "Failed to create status directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        Ok(Self { dir })
    }

    /// Directory holding the records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for a job
    pub fn record_path(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(format!("{}.json", job_id))
    }

    /// Persist the full record for a job, replacing any previous one
    pub async fn write(&self, job_id: &JobId, record: &JobRecord) -> Result<()> {
        let data = serde_json::to_vec(record)?;
        let path = self.record_path(job_id);
        let tmp_path = self.dir.join(format!("{}.json.tmp", job_id));

        tokio::fs::write(&tmp_path, &data).await.map_err(|e| {
            Error::status_store(format!("Failed to write status for job {}: {}", job_id, e))
        })?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            Error::status_store(format!("Failed to commit status for job {}: {}", job_id, e))
        })?;

        tracing::debug!(job_id = %job_id, status = %record.status, "Status written");
        Ok(())
    }

    /// Current record for a job, `None` if the job is unknown
    pub async fn read(&self, job_id: &JobId) -> Result<Option<JobRecord>> {
        let data = match tokio::fs::read(self.record_path(job_id)).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::status_store(format!(
                    "Failed to read status for job {}: {}",
                    job_id, e
                )))
            }
        };

        let record = serde_json::from_slice(&data)?;
        Ok(Some(record))
    }
}
