use thiserror::Error;

/// Errors raised while running the external media tools
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed ({}): {stderr}", status_label(.status))]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("{tool} timed out after {timeout_secs}s")]
    Timeout { tool: String, timeout_secs: u64 },

    #[error("Failed to parse ffprobe output: {0}")]
    InvalidProbeOutput(String),

    #[error("no streams found in video file")]
    NoStreams,

    #[error("invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },
}

fn status_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl ProcessingError {
    /// Whether the error came from reading stream geometry rather than
    /// from running a tool.
    pub fn is_probe_output(&self) -> bool {
        matches!(
            self,
            ProcessingError::InvalidProbeOutput(_)
                | ProcessingError::NoStreams
                | ProcessingError::InvalidDimensions { .. }
        )
    }
}

impl From<ProcessingError> for clipvault_core::AppError {
    fn from(err: ProcessingError) -> Self {
        if err.is_probe_output() {
            clipvault_core::AppError::Probe(err.to_string())
        } else {
            clipvault_core::AppError::Processing(err.to_string())
        }
    }
}
