//! Storage module for job status persistence
//!
//! Provides a file-per-job status store.

mod status_store;

pub use status_store::StatusStore;
