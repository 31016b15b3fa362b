//! Local filesystem storage.
//!
//! Objects live under `base_path/{key}`. The location name is the directory
//! name of `base_path`. Presigned URLs point at `base_url/{key}` and carry
//! `expires` (unix seconds) and `signature`, where
//! `signature = base64url(HMAC-SHA256(secret, "{location}\n{key}\n{expires}"))`.
//! Whatever serves `base_url` checks them with [`LocalStorage::verify_signature`].

use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const GENERATED_SECRET_LEN: usize = 32;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    location: String,
    secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Asset root directory (created if missing)
    /// * `base_url` - Base URL the asset root is served under (e.g., "http://localhost:8091/assets")
    /// * `secret` - HMAC key for presigned URLs. When absent a random key is
    ///   generated, so URLs stop verifying after a restart.
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        secret: Option<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let location = base_path
            .canonicalize()?
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                StorageError::ConfigError(format!(
                    "Storage directory {} has no usable name",
                    base_path.display()
                ))
            })?;

        let secret = match secret {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("No signing secret configured for local storage, generating one");
                let mut generated = vec![0u8; GENERATED_SECRET_LEN];
                OsRng.try_fill_bytes(&mut generated).map_err(|e| {
                    StorageError::ConfigError(format!("Failed to generate signing secret: {}", e))
                })?;
                generated
            }
        };

        Ok(LocalStorage {
            base_path,
            base_url,
            location,
            secret,
        })
    }

    /// Location name recorded in references to objects in this store.
    pub fn location(&self) -> &str {
        &self.location
    }

    fn check_location(&self, location: &str) -> StorageResult<()> {
        if location != self.location {
            return Err(StorageError::UnknownLocation(location.to_string()));
        }
        Ok(())
    }

    /// Convert storage key to filesystem path, rejecting anything that could
    /// escape the asset root.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.starts_with('/')
            || storage_key.contains('\\')
            || storage_key
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(StorageError::InvalidKey(format!(
                "Storage key {:?} contains invalid path segments",
                storage_key
            )));
        }

        Ok(self.base_path.join(storage_key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn sync_file(file: &fs::File, path: &Path) -> StorageResult<()> {
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })
    }

    fn sign(&self, location: &str, key: &str, expires: u64) -> String {
        let mut mac = self.mac();
        mac.update(signing_payload(location, key, expires).as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    fn mac(&self) -> Hmac<Sha256> {
        // HMAC accepts keys of any length, and the secret is never empty.
        match Hmac::<Sha256>::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC accepts any key size"),
        }
    }

    /// Check a presigned URL's signature and expiry against `now`.
    pub fn verify_signature(
        &self,
        key: &str,
        expires: u64,
        signature: &str,
        now: SystemTime,
    ) -> bool {
        let now_secs = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if now_secs > expires {
            return false;
        }

        let Ok(tag) = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };

        let mut mac = self.mac();
        mac.update(signing_payload(&self.location, key, expires).as_bytes());
        mac.verify_slice(&tag).is_ok()
    }

    fn object_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            encoded.join("/")
        )
    }
}

fn signing_payload(location: &str, key: &str, expires: u64) -> String {
    format!("{}\n{}\n{}", location, key, expires)
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        location: &str,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.check_location(location)?;
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        Self::sync_file(&file, &path).await?;

        tracing::info!(
            key = %key,
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(())
    }

    async fn put_file(
        &self,
        location: &str,
        key: &str,
        source: &Path,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.check_location(location)?;
        let path = self.key_to_path(key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();
        let size = fs::copy(source, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                path.display(),
                e
            ))
        })?;

        // fs::copy leaves the data in the page cache.
        let copied = fs::File::open(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        Self::sync_file(&copied, &path).await?;

        tracing::info!(
            key = %key,
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(())
    }

    async fn presign_get(
        &self,
        location: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.check_location(location)?;
        self.key_to_path(key)?;

        let expires = SystemTime::now()
            .checked_add(expires_in)
            .ok_or_else(|| StorageError::PresignFailed("Expiry overflows".to_string()))?
            .duration_since(UNIX_EPOCH)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?
            .as_secs();

        let signature = self.sign(location, key, expires);

        Ok(format!(
            "{}?expires={}&signature={}",
            self.object_url(key),
            expires,
            signature
        ))
    }

    fn upload_location(&self) -> &str {
        &self.location
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(
            dir.join("assets"),
            "http://localhost:8091/assets".to_string(),
            Some(b"test-secret".to_vec()),
        )
        .await
        .unwrap()
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let query = url.split_once('?').unwrap().1;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_put_writes_under_key() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        assert_eq!(storage.location(), "assets");

        storage
            .put(
                "assets",
                "landscape/abc.mp4",
                Bytes::from_static(b"moov"),
                "video/mp4",
            )
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("assets/landscape/abc.mp4")).unwrap();
        assert_eq!(written, b"moov");
    }

    #[tokio::test]
    async fn test_local_storage_put_file_copies() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let source = dir.path().join("upload.mp4.processing");
        std::fs::write(&source, b"faststart").unwrap();

        storage
            .put_file("assets", "portrait/xyz.mp4", &source, "video/mp4")
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("assets/portrait/xyz.mp4")).unwrap();
        assert_eq!(written, b"faststart");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_local_storage_put_file_replaces_and_syncs() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let source = dir.path().join("upload.mp4.processing");

        std::fs::write(&source, b"first-version-longer").unwrap();
        storage
            .put_file("assets", "other/k.mp4", &source, "video/mp4")
            .await
            .unwrap();

        std::fs::write(&source, b"second").unwrap();
        storage
            .put_file("assets", "other/k.mp4", &source, "video/mp4")
            .await
            .unwrap();

        let target = dir.path().join("assets/other/k.mp4");
        assert_eq!(std::fs::read(&target).unwrap(), b"second");
        assert_eq!(std::fs::metadata(&target).unwrap().len(), 6);

        let missing = dir.path().join("missing.processing");
        let err = storage
            .put_file("assets", "other/missing.mp4", &missing, "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(_)));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        for key in ["../../../etc/passwd", "/etc/passwd", "a//b", "landscape/../x"] {
            let result = storage
                .put("assets", key, Bytes::from_static(b"x"), "video/mp4")
                .await;
            assert!(matches!(result, Err(StorageError::InvalidKey(_))), "{}", key);
        }
    }

    #[tokio::test]
    async fn test_unknown_location_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage
            .presign_get("other-bucket", "landscape/abc.mp4", Duration::from_secs(300))
            .await;
        assert!(matches!(result, Err(StorageError::UnknownLocation(_))));
    }

    #[tokio::test]
    async fn test_presigned_url_verifies_until_expiry() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let url = storage
            .presign_get("assets", "landscape/abc.mp4", Duration::from_secs(300))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:8091/assets/landscape/abc.mp4?"));

        let expires: u64 = query_param(&url, "expires").parse().unwrap();
        let signature = query_param(&url, "signature");
        let now = SystemTime::now();
        let now_secs = now.duration_since(UNIX_EPOCH).unwrap().as_secs();
        assert!(expires >= now_secs + 299 && expires <= now_secs + 301);

        assert!(storage.verify_signature("landscape/abc.mp4", expires, signature, now));
        assert!(!storage.verify_signature("landscape/other.mp4", expires, signature, now));
        assert!(!storage.verify_signature("landscape/abc.mp4", expires + 1, signature, now));

        let later = now + Duration::from_secs(301);
        assert!(!storage.verify_signature("landscape/abc.mp4", expires, signature, later));
    }
}
