use serde::Serialize;

/// Output format for log events, chosen by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initialize tracing for CLI binaries.
///
/// Events go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[derive(Debug, Serialize)]
pub struct UploadOutput {
    pub video_id: uuid::Uuid,
    pub reference: String,
    pub signed_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProbeOutput {
    pub path: String,
    pub aspect: clipvault_core::AspectClass,
}

#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    pub reference: String,
    pub signed_url: String,
    pub expires_in_secs: u64,
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{}", out);
    Ok(())
}
