//! Seedr API client
//!
//! Uses the password grant of Seedr's OAuth endpoint and the resource API
//! behind it. The access token is cached and requested again once when a
//! call is answered with 401.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;

use super::remote_storage::RemoteStorage;
use crate::config::SeedrConfig;
use crate::error::{Error, Result};
use crate::types::ItemType;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// Seedr account client
pub struct SeedrClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: SeedrConfig,
    /// Cached access token
    token: RwLock<Option<String>>,
}

impl SeedrClient {
    /// Create a new Seedr client
    pub fn new(config: &SeedrConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
            token: RwLock::new(None),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/oauth_test/token.php", self.config.base_url)
    }

    fn resource_url(&self) -> String {
        format!("{}/oauth_test/resource.php", self.config.base_url)
    }

    fn folder_url(&self) -> String {
        format!("{}/api/folder", self.config.base_url)
    }

    /// Log in with the account credentials and cache the token
    async fn login(&self) -> Result<String> {
        let params = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("type", "login"),
            ("username", self.config.email.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::remote(format!("Seedr login request failed: {}", e.without_url())))?;

        let status = response.status();
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::remote(format!("Failed to parse Seedr login response: {}", e.without_url())))?;

        match token.access_token {
            Some(access_token) if status.is_success() => {
                tracing::info!("Logged in to Seedr as {}", self.config.email);
                *self.token.write() = Some(access_token.clone());
                Ok(access_token)
            }
            _ => Err(Error::remote(format!(
                "Seedr login failed: HTTP {} ({})",
                status,
                token.error.unwrap_or_else(|| "no access token".to_string())
            ))),
        }
    }

    /// Cached token, logging in first if there is none
    async fn access_token(&self) -> Result<String> {
        let cached = self.token.read().clone();
        match cached {
            Some(token) => Ok(token),
            None => self.login().await,
        }
    }

    /// Send a request built around the current token, logging in again once on 401
    async fn with_token<F, Fut>(&self, request: F) -> Result<Value>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Response>>,
    {
        let token = self.access_token().await?;
        let mut response = request(token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("Seedr token rejected, logging in again");
            *self.token.write() = None;
            let token = self.login().await?;
            response = request(token).await?;
        }

        Self::decode(response).await
    }

    /// Turn a Seedr response into its JSON payload
    async fn decode(response: Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::remote(format!("Seedr request failed: HTTP {}", status)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::remote(format!("Failed to parse Seedr response: {}", e.without_url())))?;

        // The resource API reports some failures in-band
        if payload.get("result") == Some(&Value::Bool(false)) {
            return Err(Error::remote(format!("Seedr rejected the request: {}", payload)));
        }

        Ok(payload)
    }

    /// POST a form to the resource API
    async fn resource_call(&self, params: Vec<(&'static str, String)>) -> Result<Value> {
        let url = self.resource_url();
        self.with_token(|token| {
            let request = self
                .client
                .post(&url)
                .query(&[("access_token", token)])
                .form(&params)
                .send();
            async move { Ok(request.await?) }
        })
        .await
    }

    async fn delete_item(&self, item_type: ItemType, id: &str) -> Result<Value> {
        let items = json!([{ "type": item_type.as_str(), "id": id }]);
        self.resource_call(vec![
            ("func", "delete".to_string()),
            ("delete_arr", items.to_string()),
        ])
        .await
    }
}

#[async_trait]
impl RemoteStorage for SeedrClient {
    async fn upload_file(&self, path: &Path, file_name: &str) -> Result<Value> {
        let url = self.resource_url();
        let mime = mime_guess::from_path(file_name).first_or_octet_stream().to_string();

        tracing::info!("Uploading {} to Seedr as '{}'", path.display(), file_name);

        self.with_token(|token| {
            let url = url.clone();
            let filename = file_name.to_string();
            let mime = mime.clone();
            let client = self.client.clone();

            async move {
                // The body stream is consumed per attempt, so the file is reopened each time
                let file = tokio::fs::File::open(path).await?;
                let size = file.metadata().await?.len();
                let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), size)
                    .file_name(filename)
                    .mime_str(&mime)?;
                let form = Form::new()
                    .text("func", "add_torrent")
                    .part("torrent_file", part);

                Ok(client
                    .post(&url)
                    .query(&[("access_token", token)])
                    .multipart(form)
                    .send()
                    .await?)
            }
        })
        .await
    }

    async fn add_torrent(&self, magnet: &str) -> Result<Value> {
        self.resource_call(vec![
            ("func", "add_torrent".to_string()),
            ("torrent_magnet", magnet.to_string()),
        ])
        .await
    }

    async fn list_contents(&self) -> Result<Value> {
        let url = self.folder_url();
        self.with_token(|token| {
            let request = self
                .client
                .get(&url)
                .query(&[("access_token", token)])
                .send();
            async move { Ok(request.await?) }
        })
        .await
    }

    async fn get_file(&self, file_id: &str) -> Result<Value> {
        self.resource_call(vec![
            ("func", "fetch_file".to_string()),
            ("folder_file_id", file_id.to_string()),
        ])
        .await
    }

    async fn delete_file(&self, file_id: &str) -> Result<Value> {
        self.delete_item(ItemType::File, file_id).await
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<Value> {
        self.delete_item(ItemType::Folder, folder_id).await
    }

    fn name(&self) -> &str {
        "seedr"
    }
}
