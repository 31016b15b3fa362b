use crate::command::CommandSpec;
use crate::error::ProcessingError;
use crate::pool::ToolPool;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix appended to the input path to name the remuxed output.
pub const PROCESSING_SUFFIX: &str = ".processing";

/// Rewrites an MP4 so its index (`moov` atom) precedes the media data, letting
/// playback start before the download completes. Streams are copied, never
/// re-encoded.
#[derive(Clone)]
pub struct FastStartProcessor {
    pool: ToolPool,
    ffmpeg_path: String,
}

impl FastStartProcessor {
    pub fn new(pool: ToolPool, ffmpeg_path: impl Into<String>) -> Self {
        Self {
            pool,
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Where [`fast_start`](Self::fast_start) writes its output for `input`.
    pub fn output_path(input: &Path) -> PathBuf {
        let mut name = OsString::from(input.as_os_str());
        name.push(PROCESSING_SUFFIX);
        PathBuf::from(name)
    }

    /// Remux `input` into `<input>.processing` and return that path.
    ///
    /// Neither file is deleted here, including on failure; the caller owns both.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    pub async fn fast_start(&self, input: &Path) -> Result<PathBuf, ProcessingError> {
        let start = std::time::Instant::now();
        let output_path = Self::output_path(input);

        let spec = CommandSpec::new(self.ffmpeg_path.clone())
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output_path);

        let output = self.pool.run(spec).await?;

        if !output.success() {
            let stderr = output.stderr_lossy();
            tracing::error!(status = ?output.status_code, stderr = %stderr, "ffmpeg remux failed");
            return Err(ProcessingError::ToolFailed {
                tool: "ffmpeg".to_string(),
                status: output.status_code,
                stderr,
            });
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            output = %output_path.display(),
            "Fast-start remux completed"
        );

        Ok(output_path)
    }
}
