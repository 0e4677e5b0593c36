//! Job dispatch: stage, record, spawn

use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::staging::stage_upload;
use super::worker::UploadWorker;
use crate::error::{Error, Result};
use crate::providers::RemoteStorage;
use crate::storage::StatusStore;
use crate::types::{JobId, JobRecord};

/// Accepts uploads and hands them to background workers
///
/// Only the local copy is awaited. The `pending` record is written before
/// the worker is spawned, so the record sequence of a job is always
/// `pending`, `processing`, terminal.
pub struct JobDispatcher {
    store: StatusStore,
    remote: Arc<dyn RemoteStorage>,
    staging_dir: PathBuf,
}

impl JobDispatcher {
    /// Create a dispatcher, creating the staging directory if needed
    pub async fn new(
        store: StatusStore,
        remote: Arc<dyn RemoteStorage>,
        staging_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let staging_dir = staging_dir.into();
        tokio::fs::create_dir_all(&staging_dir).await.map_err(|e| {
            Error::Config(format!(
                "Failed to create staging directory {}: {}",
                staging_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            store,
            remote,
            staging_dir,
        })
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Stage an upload and schedule its background upload
    ///
    /// Returns as soon as the bytes are on local disk and the job is recorded
    /// as pending. If staging fails no record exists and no worker runs.
    pub async fn dispatch<S, E>(&self, filename: &str, body: S) -> Result<JobId>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Into<Error>,
    {
        let job_id = JobId::new();

        let staged = stage_upload(&self.staging_dir, &job_id, filename, body).await?;

        // On failure `staged` is dropped here, which removes the file
        self.store.write(&job_id, &JobRecord::pending()).await?;

        let worker = UploadWorker::new(self.store.clone(), Arc::clone(&self.remote));
        tokio::spawn(worker.run(job_id, staged));

        tracing::info!(job_id = %job_id, "Queued upload of '{}'", filename);
        Ok(job_id)
    }
}
