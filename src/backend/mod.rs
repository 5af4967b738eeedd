//! Remote storage backend.
//!
//! The upload endpoint and the file listing live in a backend-as-a-service.
//! [`UploadBackend`] is the seam; providers are selected from configuration.
//!
//! - [`appwrite`]: Appwrite-compatible REST API over `reqwest`
//! - [`memory`]: in-process store for development and tests

pub mod appwrite;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::file_type::FileKind;
use crate::uploader::SelectedFile;

pub use appwrite::AppwriteClient;
pub use memory::MemoryBackend;

/// Backend error type.
#[derive(Error, Debug)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the backend.
        message: String,
    },

    /// Provider misconfigured.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Everything the upload endpoint needs for one file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: SelectedFile,
    pub owner_id: String,
    pub account_id: String,
    /// Navigation path whose listing the upload invalidates.
    pub path: String,
}

/// File record created by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    pub url: String,
    pub kind: FileKind,
    pub extension: String,
    pub size: u64,
    pub owner: String,
    pub account_id: String,
    pub bucket_file_id: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait UploadBackend: Send + Sync + std::fmt::Debug {
    /// Store one file. `Ok(None)` means the backend declined without an error.
    async fn upload_file(&self, request: UploadRequest) -> Result<Option<UploadedFile>, BackendError>;

    /// Files owned by `owner_id`, newest first. An empty `kinds` means all kinds.
    async fn list_files(
        &self,
        owner_id: &str,
        kinds: &[FileKind],
    ) -> Result<Vec<UploadedFile>, BackendError>;
}

/// Build the storage backend named by `config.provider`.
pub fn from_config(config: &BackendConfig) -> Result<Arc<dyn UploadBackend>, BackendError> {
    match config.provider.as_str() {
        "appwrite" => Ok(Arc::new(AppwriteClient::from_config(config)?)),
        "memory" => Ok(Arc::new(MemoryBackend::new())),
        other => Err(BackendError::Config(format!(
            "unknown backend provider: {other}"
        ))),
    }
}
