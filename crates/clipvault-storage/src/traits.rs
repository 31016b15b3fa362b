//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Unknown storage location: {0}")]
    UnknownLocation(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for clipvault_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigError(msg) => clipvault_core::AppError::Internal(msg),
            other => clipvault_core::AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// A `location` names the container an object lives in (an S3 bucket, or the
/// asset root for local storage). Backends must tolerate concurrent calls.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `location`/`key`. Returns only once the write is durable.
    async fn put(
        &self,
        location: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Store the contents of a local file under `location`/`key`.
    ///
    /// The default implementation reads the whole file into memory and
    /// delegates to [`Storage::put`].
    async fn put_file(
        &self,
        location: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        let data = tokio::fs::read(path).await?;
        self.put(location, key, Bytes::from(data), content_type)
            .await
    }

    /// Generate a presigned, time-limited GET URL for direct access.
    async fn presign_get(
        &self,
        location: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Location new uploads are written to.
    fn upload_location(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
