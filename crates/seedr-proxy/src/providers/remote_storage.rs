//! Remote storage provider trait

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use crate::error::Result;

/// Operations the proxy needs from the cloud storage account
///
/// Every call either succeeds with the provider's JSON payload or fails;
/// callers do not inspect provider-specific failure details.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Upload the local file at `path` under the name `file_name`
    async fn upload_file(&self, path: &Path, file_name: &str) -> Result<Value>;

    /// Add a torrent from a magnet link
    async fn add_torrent(&self, magnet: &str) -> Result<Value>;

    /// List the root folder
    async fn list_contents(&self) -> Result<Value>;

    /// Fetch one file's details
    async fn get_file(&self, file_id: &str) -> Result<Value>;

    /// Delete a file
    async fn delete_file(&self, file_id: &str) -> Result<Value>;

    /// Delete a folder
    async fn delete_folder(&self, folder_id: &str) -> Result<Value>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
