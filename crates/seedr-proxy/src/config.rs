//! Configuration for the proxy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML config file
pub const CONFIG_FILE_ENV: &str = "SEEDR_PROXY_CONFIG";

/// Main proxy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Local storage configuration
    pub storage: StorageConfig,
    /// Seedr account configuration
    pub seedr: SeedrConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 2GB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 2 * 1024 * 1024 * 1024, // 2GB
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one status record per job
    pub status_dir: PathBuf,
    /// Directory uploads are staged in before the background upload
    pub staging_dir: PathBuf,
    /// Remove staged files left over from a previous run on startup
    pub purge_staging_on_start: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            status_dir: PathBuf::from("/tmp/upload_statuses"),
            staging_dir: PathBuf::from("/tmp/seedr-proxy/staging"),
            purge_staging_on_start: true,
        }
    }
}

/// Seedr account configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedrConfig {
    /// Seedr base URL
    pub base_url: String,
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
    /// OAuth client id used for the password grant
    pub client_id: String,
    /// Request timeout in seconds (uploads included)
    pub timeout_secs: u64,
}

impl Default for SeedrConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.seedr.cc".to_string(),
            email: String::new(),
            password: String::new(),
            client_id: "seedr_chrome".to_string(),
            timeout_secs: 600, // 10 minutes
        }
    }
}

// Keep the password out of logs
impl std::fmt::Debug for SeedrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedrConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProxyConfig {
    /// Load configuration from the optional config file and the environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_FILE_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Override fields from environment variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = lookup("SEEDR_EMAIL") {
            self.seedr.email = email;
        }
        if let Some(password) = lookup("SEEDR_PASS") {
            self.seedr.password = password;
        }
        if let Some(base_url) = lookup("SEEDR_BASE_URL") {
            self.seedr.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(host) = lookup("SEEDR_PROXY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SEEDR_PROXY_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid SEEDR_PROXY_PORT: {}", port)))?;
        }
        if let Some(dir) = lookup("SEEDR_PROXY_STATUS_DIR") {
            self.storage.status_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("SEEDR_PROXY_STAGING_DIR") {
            self.storage.staging_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Credentials are mandatory
    pub fn validate(&self) -> Result<()> {
        if self.seedr.email.is_empty() || self.seedr.password.is_empty() {
            return Err(Error::Config(
                "SEEDR_EMAIL and SEEDR_PASS environment variables are required.".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_credentials_rejected() {
        let config = ProxyConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SEEDR_EMAIL", "me@example.com"),
            ("SEEDR_PASS", "pw"),
            ("SEEDR_BASE_URL", "http://localhost:9000/"),
            ("SEEDR_PROXY_PORT", "9100"),
            ("SEEDR_PROXY_STATUS_DIR", "/var/lib/proxy/status"),
        ]
        .into_iter()
        .collect();

        let mut config = ProxyConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.seedr.base_url, "http://localhost:9000");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.storage.status_dir, PathBuf::from("/var/lib/proxy/status"));
        assert_eq!(config.storage.staging_dir, PathBuf::from("/tmp/seedr-proxy/staging"));
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = ProxyConfig::default();
        let result = config.apply_env(|key| (key == "SEEDR_PROXY_PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_toml() {
        let config = ProxyConfig::from_toml(
            r#"
            [server]
            port = 8080

            [seedr]
            email = "me@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.seedr.email, "me@example.com");
        assert_eq!(config.seedr.client_id, "seedr_chrome");
    }

    #[test]
    fn test_debug_redacts_password() {
        let seedr = SeedrConfig {
            password: "topsecret".to_string(),
            ..SeedrConfig::default()
        };
        assert!(!format!("{:?}", seedr).contains("topsecret"));
    }
}
