//! Proxy server binary
//!
//! Run with: cargo run -p seedr-proxy --bin seedr-proxy-server

use seedr_proxy::{config::ProxyConfig, server::ProxyServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seedr_proxy=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ProxyConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Seedr account: {}", config.seedr.email);
    tracing::info!("  - Seedr base URL: {}", config.seedr.base_url);
    tracing::info!("  - Status dir: {}", config.storage.status_dir.display());
    tracing::info!("  - Staging dir: {}", config.storage.staging_dir.display());
    tracing::info!("  - Max upload size: {} bytes", config.server.max_upload_size);

    // Create and start server
    let server = ProxyServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("\nEndpoints:");
    println!("  POST   /upload                 - Upload a file in the background");
    println!("  GET    /upload/status/:job_id  - Poll an upload job");
    println!("  POST   /add                    - Add a magnet link");
    println!("  GET    /list                   - List remote contents");
    println!("  GET    /status                 - Remote file or listing");
    println!("  DELETE /items/:item_id         - Delete a remote file or folder");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
