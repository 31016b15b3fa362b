//! Upload pipeline: validate → buffer → probe → remux → store → persist.
//!
//! Stages run strictly in sequence for one upload and nothing is retried.
//! The buffered original and the remuxed copy are both owned by drop guards,
//! so they are removed on every exit path, including when the caller drops
//! the future mid-flight. The reference is written only after the object
//! store has accepted the bytes.

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::temp::ScopedPath;
use clipvault_core::Video;
use clipvault_processing::FastStartProcessor;
use clipvault_storage::keys::media_type_to_ext;
use clipvault_storage::{compute_key, VideoReference};
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Raw upload body plus the headers the pipeline cares about
pub struct UploadRequest<R> {
    pub content_type: String,
    /// Declared length, if the transport provided one
    pub content_length: Option<u64>,
    pub body: R,
}

impl<R> UploadRequest<R> {
    pub fn new(content_type: impl Into<String>, body: R) -> Self {
        Self {
            content_type: content_type.into(),
            content_length: None,
            body,
        }
    }

    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }
}

#[derive(Clone)]
pub struct UploadPipeline {
    ctx: PipelineContext,
}

impl UploadPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Store a new video file for `video_id` and persist its reference.
    ///
    /// Returns the updated record, whose `video_url` holds the raw
    /// `"<location>,<key>"` reference (not a presigned URL).
    #[tracing::instrument(skip_all, fields(video_id = %video_id, user_id = %user_id))]
    pub async fn upload<R>(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        request: UploadRequest<R>,
    ) -> Result<Video, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = std::time::Instant::now();

        let media_type = self
            .ctx
            .validator
            .validate_content_type(&request.content_type)?;
        self.ctx
            .validator
            .validate_declared_size(request.content_length)?;

        let video = self
            .ctx
            .repository
            .get_video(video_id)
            .await?
            .ok_or(PipelineError::NotFound(video_id))?;
        if video.user_id != user_id {
            return Err(PipelineError::Unauthorized { video_id, user_id });
        }

        let original = self.buffer(request.body, &media_type).await?;

        let aspect = self
            .ctx
            .probe
            .probe(original.path())
            .await
            .map_err(PipelineError::Probe)?;

        // Guard the output before ffmpeg starts so a partial file is removed too.
        let processed = ScopedPath::new(FastStartProcessor::output_path(original.path()));
        self.ctx
            .faststart
            .fast_start(original.path())
            .await
            .map_err(PipelineError::Remux)?;

        let asset = self.ctx.keys.generate(&media_type)?;
        let key = compute_key(aspect, &asset);
        let reference = VideoReference::compose(self.ctx.storage.upload_location(), key)?;

        self.ctx
            .storage
            .put_file(
                reference.location(),
                reference.key(),
                processed.path(),
                &media_type,
            )
            .await?;

        let updated = self
            .ctx
            .repository
            .update_video_url(video_id, &reference.to_string())
            .await?;

        tracing::info!(
            bucket = %reference.location(),
            key = %reference.key(),
            aspect = %aspect,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video upload stored"
        );

        Ok(updated)
    }

    /// Copy the body into a temp file, enforcing the size limit as bytes arrive.
    async fn buffer<R>(&self, body: R, media_type: &str) -> Result<NamedTempFile, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        tokio::fs::create_dir_all(&self.ctx.temp_dir)
            .await
            .map_err(PipelineError::Buffer)?;

        let suffix = media_type_to_ext(media_type);
        let temp = tempfile::Builder::new()
            .prefix("clipvault-upload-")
            .suffix(&suffix)
            .tempfile_in(&self.ctx.temp_dir)
            .map_err(PipelineError::Buffer)?;

        let mut file = tokio::fs::File::from_std(temp.reopen().map_err(PipelineError::Buffer)?);

        let limit = self.ctx.validator.max_upload_bytes();
        let mut limited = body.take(limit.saturating_add(1));
        let written = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(PipelineError::Buffer)?;
        file.flush().await.map_err(PipelineError::Buffer)?;

        self.ctx.validator.validate_size(written)?;

        tracing::debug!(
            path = %temp.path().display(),
            size_bytes = written,
            "Upload buffered"
        );

        Ok(temp)
    }
}
