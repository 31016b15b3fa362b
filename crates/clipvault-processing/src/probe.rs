//! Stream geometry probing and aspect classification.

use crate::command::CommandSpec;
use crate::error::ProcessingError;
use crate::pool::ToolPool;
use clipvault_core::AspectClass;
use serde::Deserialize;
use std::path::Path;

const LANDSCAPE_RATIO: (f64, f64) = (1.7, 1.8);
const PORTRAIT_RATIO: (f64, f64) = (0.5, 0.6);

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    #[serde(default)]
    streams: Vec<FFprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Classify geometry by `width / height`.
///
/// 16:9 (1.78) falls in the landscape band and 9:16 (0.5625) in the portrait
/// band. Everything between the bands, square video included, is `Other`.
pub fn classify(width: u32, height: u32) -> Result<AspectClass, ProcessingError> {
    if width == 0 || height == 0 {
        return Err(ProcessingError::InvalidDimensions { width, height });
    }

    let ratio = f64::from(width) / f64::from(height);

    if (LANDSCAPE_RATIO.0..=LANDSCAPE_RATIO.1).contains(&ratio) {
        return Ok(AspectClass::Landscape);
    }
    if (PORTRAIT_RATIO.0..=PORTRAIT_RATIO.1).contains(&ratio) {
        return Ok(AspectClass::Portrait);
    }
    Ok(AspectClass::Other)
}

/// Reads the first stream's dimensions with ffprobe
#[derive(Clone)]
pub struct MediaProbe {
    pool: ToolPool,
    ffprobe_path: String,
}

impl MediaProbe {
    pub fn new(pool: ToolPool, ffprobe_path: impl Into<String>) -> Self {
        Self {
            pool,
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Probe the original (pre-remux) file and classify its first stream.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe(&self, path: &Path) -> Result<AspectClass, ProcessingError> {
        let start = std::time::Instant::now();

        let spec = CommandSpec::new(self.ffprobe_path.clone())
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path);

        let output = self.pool.run(spec).await?;

        if !output.success() {
            let stderr = output.stderr_lossy();
            tracing::error!(status = ?output.status_code, stderr = %stderr, "ffprobe failed");
            return Err(ProcessingError::ToolFailed {
                tool: "ffprobe".to_string(),
                status: output.status_code,
                stderr,
            });
        }

        let parsed: FFprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProcessingError::InvalidProbeOutput(e.to_string()))?;

        let stream = parsed.streams.first().ok_or(ProcessingError::NoStreams)?;
        let aspect = classify(stream.width, stream.height)?;

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            width = stream.width,
            height = stream.height,
            aspect = %aspect,
            "Video probe completed"
        );

        Ok(aspect)
    }
}
