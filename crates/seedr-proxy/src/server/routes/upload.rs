//! Background upload and job status endpoints

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::{Error, Result, ValidationDetail};
use crate::server::state::AppState;
use crate::types::{JobId, JobRecord};

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// Response from `POST /upload`
#[derive(Debug, Serialize)]
pub struct UploadAccepted {
    pub job_id: JobId,
}

/// POST /upload - Stage a file and upload it to remote storage in the background
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadAccepted>)> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let job_id = state.dispatcher().dispatch(&filename, field).await?;

        return Ok((StatusCode::ACCEPTED, Json(UploadAccepted { job_id })));
    }

    Err(Error::Validation(vec![ValidationDetail::missing("body", FILE_FIELD)]))
}

/// GET /upload/status/:job_id - Current record of an upload job
pub async fn get_upload_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRecord>> {
    let id: JobId = job_id
        .parse()
        .map_err(|_| Error::JobNotFound(job_id.clone()))?;

    state
        .status_store()
        .read(&id)
        .await?
        .map(Json)
        .ok_or(Error::JobNotFound(job_id))
}
