use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload, Result as ObjectResult,
};
use std::collections::HashMap;
use std::time::Duration;

/// S3 storage implementation
///
/// Holds one `AmazonS3` store per configured bucket. The map is built once and
/// never mutated, so concurrent puts and presigns share it without locking.
#[derive(Clone)]
pub struct S3Storage {
    stores: HashMap<String, AmazonS3>,
    upload_bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `buckets` - Buckets this instance may address (the reference "location").
    ///   New uploads go to the first one; the rest are read-only for presigning.
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        buckets: Vec<String>,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        if buckets.is_empty() {
            return Err(StorageError::ConfigError(
                "At least one S3 bucket must be configured".to_string(),
            ));
        }

        let upload_bucket = buckets[0].clone();
        let mut stores = HashMap::with_capacity(buckets.len());
        for bucket in buckets {
            // Credentials come from the environment; region/bucket/endpoint are explicit.
            let mut builder = AmazonS3Builder::from_env()
                .with_region(region.clone())
                .with_bucket_name(bucket.clone());

            if let Some(ref endpoint) = endpoint_url {
                let allow_http = endpoint.starts_with("http://");
                builder = builder
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(allow_http);
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;
            stores.insert(bucket, store);
        }

        Ok(S3Storage {
            stores,
            upload_bucket,
        })
    }

    fn store_for(&self, bucket: &str) -> StorageResult<&AmazonS3> {
        self.stores
            .get(bucket)
            .ok_or_else(|| StorageError::UnknownLocation(bucket.to_string()))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        location: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let store = self.store_for(location)?;
        let size = data.len() as u64;
        let path = Path::from(key.to_string());
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = store
            .put_opts(&path, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %location,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %location,
            key = %key,
            size_bytes = size,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn presign_get(
        &self,
        location: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let store = self.store_for(location)?;
        let path = Path::from(key.to_string());

        let url_result: ObjectResult<_> = store.signed_url(Method::GET, &path, expires_in).await;

        let url = url_result
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %location, key = %key, "S3 presign failed");
                StorageError::PresignFailed(e.to_string())
            })?
            .to_string();

        tracing::debug!(
            bucket = %location,
            key = %key,
            expires_in_secs = expires_in.as_secs(),
            "Generated presigned S3 URL"
        );

        Ok(url)
    }

    fn upload_location(&self) -> &str {
        &self.upload_bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
