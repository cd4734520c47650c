//! Object storage client
//!
//! Pushes uploaded file bytes to an HTTP object-storage endpoint and
//! returns the resulting public URL. Files land in a configurable folder
//! ("markdown" by default); only metadata is kept locally.

use serde::Deserialize;

/// Default folder files are uploaded into
const DEFAULT_FOLDER: &str = "markdown";

/// Object storage configuration loaded from environment
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Upload endpoint; uploads are rejected when unset
    pub api_base: String,
    pub api_key: Option<String>,
    /// Folder files are grouped under in the storage bucket
    pub folder: String,
}

impl StorageConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("STORAGE_API_BASE").unwrap_or_default(),
            api_key: std::env::var("STORAGE_API_KEY").ok(),
            folder: std::env::var("STORAGE_FOLDER").unwrap_or_else(|_| DEFAULT_FOLDER.to_string()),
        }
    }

    /// Check if an upload endpoint is configured
    pub fn is_configured(&self) -> bool {
        !self.api_base.is_empty()
    }
}

/// Storage client errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object storage is not configured")]
    NotConfigured,

    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Storage returned an error: {0}")]
    Upstream(String),
}

/// Upload receipt from the storage endpoint
#[derive(Debug, Deserialize)]
struct UploadReceipt {
    secure_url: String,
}

/// Client for the object-storage upload endpoint
#[derive(Clone)]
pub struct ObjectStorage {
    config: StorageConfig,
    http: reqwest::Client,
}

impl ObjectStorage {
    /// Create a new storage client
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Upload raw file bytes, returning the public URL
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        if !self.config.is_configured() {
            return Err(StorageError::NotConfigured);
        }

        tracing::info!(
            "Uploading '{}' ({} bytes) to folder '{}'",
            file_name,
            bytes.len(),
            self.config.folder
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("folder", self.config.folder.clone())
            .text("resource_type", "raw");

        let mut request = self.http.post(&self.config.api_base).multipart(form);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StorageError::Upstream(format!("{}: {}", status, detail)));
        }

        let receipt = response.json::<UploadReceipt>().await?;

        tracing::info!("Upload complete: {}", receipt.secure_url);

        Ok(receipt.secure_url)
    }
}
