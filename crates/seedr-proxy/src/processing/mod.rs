//! Background upload processing
//!
//! The dispatcher stages an upload and spawns a worker for it; the worker
//! reports progress only through the status store.

mod dispatcher;
mod staging;
mod worker;

pub use dispatcher::JobDispatcher;
pub use staging::{purge_staging_dir, sanitize_filename, stage_upload, StagedFile};
pub use worker::UploadWorker;
