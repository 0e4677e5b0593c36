//! Core types for the proxy

pub mod job;
pub mod remote;

pub use job::{JobId, JobRecord, JobStatus, GENERIC_FAILURE_MESSAGE};
pub use remote::ItemType;
