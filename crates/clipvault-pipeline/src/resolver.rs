//! Expands persisted references into presigned URLs on read.

use crate::context::PipelineContext;
use crate::error::PipelineError;
use clipvault_core::Video;
use clipvault_storage::{Storage, VideoReference};
use std::sync::Arc;
use std::time::Duration;

/// Validity of URLs handed out to clients.
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone)]
pub struct UrlResolver {
    storage: Arc<dyn Storage>,
}

impl UrlResolver {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn from_context(ctx: &PipelineContext) -> Self {
        Self::new(ctx.storage.clone())
    }

    /// Return a copy of `video` whose `video_url` is a presigned URL.
    ///
    /// A record without media comes back unchanged. The signed URL is never
    /// written back to storage or the repository.
    pub async fn resolve(&self, video: &Video) -> Result<Video, PipelineError> {
        let Some(ref stored) = video.video_url else {
            return Ok(video.clone());
        };

        let reference = VideoReference::parse(stored).map_err(|e| {
            tracing::error!(
                error = %e,
                video_id = %video.id,
                reference = %stored,
                "Stored video reference is malformed"
            );
            PipelineError::from(e)
        })?;

        let url = self
            .storage
            .presign_get(reference.location(), reference.key(), PRESIGNED_URL_TTL)
            .await?;

        let mut signed = video.clone();
        signed.video_url = Some(url);
        Ok(signed)
    }

    /// Resolve a list in order, failing on the first error.
    pub async fn resolve_all(&self, videos: &[Video]) -> Result<Vec<Video>, PipelineError> {
        let mut resolved = Vec::with_capacity(videos.len());
        for video in videos {
            resolved.push(self.resolve(video).await?);
        }
        Ok(resolved)
    }
}
