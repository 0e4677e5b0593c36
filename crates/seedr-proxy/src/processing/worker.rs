//! Background worker for upload jobs

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::staging::StagedFile;
use crate::providers::RemoteStorage;
use crate::storage::StatusStore;
use crate::types::{JobId, JobRecord, JobStatus};

/// Runs the remote upload of one staged file
///
/// The worker is the only writer of its job's record after dispatch: it
/// writes `processing`, then exactly one terminal record. The staged file is
/// removed before the terminal record is written, so a client that sees a
/// terminal status never races a leftover file.
pub struct UploadWorker {
    store: StatusStore,
    remote: Arc<dyn RemoteStorage>,
}

impl UploadWorker {
    /// Create a new upload worker
    pub fn new(store: StatusStore, remote: Arc<dyn RemoteStorage>) -> Self {
        Self { store, remote }
    }

    /// Process one job to its terminal status
    pub async fn run(self, job_id: JobId, mut staged: StagedFile) -> JobStatus {
        tracing::info!(
            job_id = %job_id,
            provider = self.remote.name(),
            "Upload job started for {}",
            staged.path().display()
        );

        let record = self.upload(job_id, &staged).await;

        if let Err(e) = staged.remove().await {
            tracing::error!(
                job_id = %job_id,
                "Failed to remove staged file {}: {}",
                staged.path().display(),
                e
            );
        }

        let status = record.status;
        if let Err(e) = self.store.write(&job_id, &record).await {
            tracing::error!(job_id = %job_id, "Failed to record {} status: {}", status, e);
        }

        tracing::info!(job_id = %job_id, status = %status, "Upload job finished");
        status
    }

    /// Mark the job processing and attempt the upload once
    async fn upload(&self, job_id: JobId, staged: &StagedFile) -> JobRecord {
        if let Err(e) = self.store.write(&job_id, &JobRecord::processing()).await {
            tracing::error!(job_id = %job_id, "Failed to mark job processing: {}", e);
            return JobRecord::failed();
        }

        let attempt = AssertUnwindSafe(self.remote.upload_file(staged.path(), staged.file_name()))
            .catch_unwind()
            .await;

        match attempt {
            Ok(Ok(result)) => {
                tracing::info!(job_id = %job_id, "Remote upload succeeded");
                JobRecord::completed(result)
            }
            Ok(Err(e)) => {
                tracing::error!(job_id = %job_id, error = %e, "Upload failed");
                JobRecord::failed()
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(job_id = %job_id, "Upload panicked: {}", message);
                JobRecord::failed()
            }
        }
    }
}
