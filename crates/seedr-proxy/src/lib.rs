//! seedr-proxy: HTTP proxy in front of a Seedr cloud storage account
//!
//! Large files are staged on local disk and uploaded to Seedr in the
//! background; clients poll a per-job status record. Torrent, listing and
//! delete operations are relayed synchronously.

pub mod config;
pub mod error;
pub mod processing;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::ProxyConfig;
pub use error::{Error, Result};
pub use types::{JobId, JobRecord, JobStatus};
