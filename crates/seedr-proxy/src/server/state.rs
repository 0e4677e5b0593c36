//! Application state for the proxy server

use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::error::Result;
use crate::processing::{purge_staging_dir, JobDispatcher};
use crate::providers::{RemoteStorage, SeedrClient};
use crate::storage::StatusStore;

/// Shared application state
///
/// Built once at startup; every handler and worker reaches the store and the
/// remote provider through it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: ProxyConfig,
    /// Job status records
    status_store: StatusStore,
    /// Remote storage account
    remote: Arc<dyn RemoteStorage>,
    /// Upload job dispatcher
    dispatcher: JobDispatcher,
}

impl AppState {
    /// Create new application state backed by the Seedr account in `config`
    pub async fn new(config: ProxyConfig) -> Result<Self> {
        let remote = Arc::new(SeedrClient::new(&config.seedr)?);
        tracing::info!("Seedr client initialized ({})", config.seedr.base_url);

        Self::with_remote(config, remote).await
    }

    /// Create application state around an existing remote provider
    pub async fn with_remote(config: ProxyConfig, remote: Arc<dyn RemoteStorage>) -> Result<Self> {
        tracing::info!("Initializing proxy state (provider: {})...", remote.name());

        let status_store = StatusStore::open(&config.storage.status_dir).await?;
        tracing::info!("Status store at {}", status_store.dir().display());

        if config.storage.purge_staging_on_start {
            purge_staging_dir(&config.storage.staging_dir).await?;
        }

        let dispatcher = JobDispatcher::new(
            status_store.clone(),
            Arc::clone(&remote),
            &config.storage.staging_dir,
        )
        .await?;
        tracing::info!("Staging uploads in {}", dispatcher.staging_dir().display());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                status_store,
                remote,
                dispatcher,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    /// Get status store
    pub fn status_store(&self) -> &StatusStore {
        &self.inner.status_store
    }

    /// Get remote storage provider
    pub fn remote(&self) -> &Arc<dyn RemoteStorage> {
        &self.inner.remote
    }

    /// Get job dispatcher
    pub fn dispatcher(&self) -> &JobDispatcher {
        &self.inner.dispatcher
    }
}
