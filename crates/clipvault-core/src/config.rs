//! Configuration module
//!
//! Configuration is loaded once from the environment (and an optional `.env`
//! file) and then passed explicitly to every stage of the pipeline. Nothing
//! reads the environment after startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 8091;
const MAX_UPLOAD_SIZE_MB: u64 = 1024;
const BYTES_PER_MB: u64 = 1 << 20;
const MAX_CONCURRENT_TOOLS: usize = 4;
const TOOL_TIMEOUT_SECS: u64 = 300;
const DEFAULT_ALLOWED_CONTENT_TYPES: &str = "video/mp4";

/// Process-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
}

/// Settings for the upload pipeline and its collaborators
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_read_buckets: Vec<String>, // Extra buckets older references may point at
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: PathBuf,
    pub local_storage_base_url: String,
    pub local_signing_secret: Option<String>,
    // Upload boundary
    pub max_upload_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    // External tools
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub max_concurrent_tools: usize,
    pub tool_timeout_secs: u64,
    pub temp_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig {
                server_port: DEFAULT_PORT,
                environment: "development".to_string(),
            },
            storage_backend: StorageBackend::S3,
            s3_bucket: None,
            s3_region: None,
            s3_read_buckets: Vec::new(),
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: PathBuf::from("./assets"),
            local_storage_base_url: format!("http://localhost:{}/assets", DEFAULT_PORT),
            local_signing_secret: None,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * BYTES_PER_MB,
            allowed_content_types: parse_content_types(DEFAULT_ALLOWED_CONTENT_TYPES),
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            max_concurrent_tools: MAX_CONCURRENT_TOOLS,
            tool_timeout_secs: TOOL_TIMEOUT_SECS,
            temp_dir: None,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PipelineConfig>);

impl Config {
    pub fn new(config: PipelineConfig) -> Self {
        Config(Box::new(config))
    }

    fn inner(&self) -> &PipelineConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PipelineConfig::from_env()?;
        Ok(Config::new(config))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_read_buckets(&self) -> &[String] {
        &self.inner().s3_read_buckets
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> &std::path::Path {
        &self.inner().local_storage_path
    }

    pub fn local_storage_base_url(&self) -> &str {
        &self.inner().local_storage_base_url
    }

    pub fn local_signing_secret(&self) -> Option<&str> {
        self.inner().local_signing_secret.as_deref()
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.inner().max_upload_size_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.inner().allowed_content_types
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.inner().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().ffmpeg_path
    }

    pub fn max_concurrent_tools(&self) -> usize {
        self.inner().max_concurrent_tools
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().tool_timeout_secs)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.inner().temp_dir.clone().unwrap_or_else(env::temp_dir)
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = PipelineConfig::default();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::S3,
        };

        let max_upload_size_bytes =
            upload_limit_bytes(env::var("MAX_UPLOAD_SIZE_MB").ok().as_deref())?;

        let config = PipelineConfig {
            base,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_read_buckets: env::var("S3_READ_BUCKETS")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_storage_path),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/assets", server_port)),
            local_signing_secret: env::var("LOCAL_SIGNING_SECRET").ok(),
            max_upload_size_bytes,
            allowed_content_types: env::var("ALLOWED_VIDEO_CONTENT_TYPES")
                .map(|s| parse_content_types(&s))
                .unwrap_or(defaults.allowed_content_types),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            max_concurrent_tools: env::var("MAX_CONCURRENT_TOOLS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONCURRENT_TOOLS),
            tool_timeout_secs: env::var("TOOL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(TOOL_TIMEOUT_SECS),
            temp_dir: env::var("TEMP_DIR").ok().map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.as_deref().map_or(true, str::is_empty) {
                    anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    anyhow::bail!("S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3");
                }
            }
            StorageBackend::Local => {
                if self.local_storage_base_url.trim().is_empty() {
                    anyhow::bail!("LOCAL_STORAGE_BASE_URL must not be empty");
                }
                if self.is_production() && self.local_signing_secret.is_none() {
                    anyhow::bail!("LOCAL_SIGNING_SECRET must be set in production");
                }
            }
        }

        if self.max_upload_size_bytes == 0 {
            anyhow::bail!("MAX_UPLOAD_SIZE_MB must be at least 1");
        }
        if self.allowed_content_types.is_empty() {
            anyhow::bail!("ALLOWED_VIDEO_CONTENT_TYPES must list at least one type");
        }
        if self.max_concurrent_tools == 0 {
            anyhow::bail!("MAX_CONCURRENT_TOOLS must be at least 1");
        }
        if self.tool_timeout_secs == 0 {
            anyhow::bail!("TOOL_TIMEOUT_SECS must be at least 1");
        }

        Ok(())
    }
}

/// Upload limit in bytes from a `MAX_UPLOAD_SIZE_MB` value.
fn upload_limit_bytes(value: Option<&str>) -> Result<u64, anyhow::Error> {
    let megabytes = match value {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a valid number"))?,
        None => MAX_UPLOAD_SIZE_MB,
    };
    megabytes
        .checked_mul(BYTES_PER_MB)
        .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Media types compare case-insensitively; bucket names do not.
fn parse_content_types(value: &str) -> Vec<String> {
    parse_list(value)
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3_config() -> PipelineConfig {
        PipelineConfig {
            s3_bucket: Some("clipvault-media".to_string()),
            s3_region: Some("us-east-1".to_string()),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_upload_boundary() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_upload_size_bytes, 1 << 30);
        assert_eq!(config.allowed_content_types, vec!["video/mp4".to_string()]);
    }

    #[test]
    fn test_s3_requires_bucket_and_region() {
        assert!(s3_config().validate().is_ok());

        let mut missing_bucket = s3_config();
        missing_bucket.s3_bucket = None;
        assert!(missing_bucket.validate().is_err());

        let mut aws_region_only = s3_config();
        aws_region_only.s3_region = None;
        aws_region_only.aws_region = Some("eu-west-1".to_string());
        assert!(aws_region_only.validate().is_ok());
    }

    #[test]
    fn test_local_requires_secret_in_production() {
        let mut config = PipelineConfig {
            storage_backend: StorageBackend::Local,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());

        config.base.environment = "production".to_string();
        assert!(config.validate().is_err());

        config.base.environment = "PROD".to_string();
        assert!(config.is_production());
        assert!(config.validate().is_err());

        config.local_signing_secret = Some("s3cret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_content_types_are_lowercased() {
        assert_eq!(
            parse_content_types(" Video/MP4, video/webm ,,"),
            vec!["video/mp4".to_string(), "video/webm".to_string()]
        );
    }

    #[test]
    fn test_bucket_lists_keep_case() {
        assert_eq!(
            parse_list("Clipvault-Archive, legacy-media"),
            vec!["Clipvault-Archive".to_string(), "legacy-media".to_string()]
        );
    }

    #[test]
    fn test_upload_limit_parsing() {
        assert_eq!(upload_limit_bytes(None).unwrap(), 1 << 30);
        assert_eq!(upload_limit_bytes(Some(" 8 ")).unwrap(), 8 << 20);
        assert!(upload_limit_bytes(Some("1GB")).is_err());
        assert!(upload_limit_bytes(Some("-1")).is_err());
        assert!(upload_limit_bytes(Some("17592186044416")).is_err());
    }

    #[test]
    fn test_zero_upload_limit_is_rejected() {
        let mut config = s3_config();
        config.max_upload_size_bytes = 0;
        assert!(config.validate().is_err());

        config.max_upload_size_bytes = upload_limit_bytes(Some("0")).unwrap();
        assert!(config.validate().is_err());
    }
}
