//! Clipvault CLI: drive the video asset pipeline from the command line.
//!
//! Configuration comes from the environment (or `.env`): STORAGE_BACKEND,
//! S3_BUCKET / S3_REGION for S3, LOCAL_STORAGE_PATH for local storage.

use anyhow::Context;
use clap::{Parser, Subcommand};
use clipvault_cli::{init_tracing, print_json, ProbeOutput, ResolveOutput, UploadOutput};
use clipvault_core::{Config, Video};
use clipvault_pipeline::{
    InMemoryVideoRepository, PipelineContext, UploadPipeline, UploadRequest, UrlResolver,
    PRESIGNED_URL_TTL,
};
use clipvault_processing::{MediaProbe, ToolPool};
use clipvault_storage::{create_storage, VideoReference};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "clipvault", about = "Video asset pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe, remux and store a video file, then print its reference
    Upload {
        /// Path to the video file
        file: PathBuf,
        /// Media type of the file
        #[arg(long, default_value = "video/mp4")]
        content_type: String,
        /// Title for the video record
        #[arg(long, default_value = "Untitled")]
        title: String,
    },
    /// Print the aspect class of a video file
    Probe {
        /// Path to the video file
        file: PathBuf,
    },
    /// Expand a stored "<location>,<key>" reference into a presigned URL
    Resolve {
        /// Stored reference
        reference: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Upload {
            file,
            content_type,
            title,
        } => upload(&config, file, content_type, title).await?,
        Commands::Probe { file } => {
            let probe = MediaProbe::new(ToolPool::from_config(&config), config.ffprobe_path());
            let aspect = probe
                .probe(&file)
                .await
                .with_context(|| format!("Failed to probe {}", file.display()))?;
            print_json(&ProbeOutput {
                path: file.display().to_string(),
                aspect,
            })?;
        }
        Commands::Resolve { reference } => {
            let parsed = VideoReference::parse(&reference)?;
            let storage = create_storage(&config).await?;
            let signed_url = storage
                .presign_get(parsed.location(), parsed.key(), PRESIGNED_URL_TTL)
                .await?;
            print_json(&ResolveOutput {
                reference,
                signed_url,
                expires_in_secs: PRESIGNED_URL_TTL.as_secs(),
            })?;
        }
    }

    Ok(())
}

async fn upload(
    config: &Config,
    file: PathBuf,
    content_type: String,
    title: String,
) -> anyhow::Result<()> {
    let storage = create_storage(config).await?;

    // The CLI has no metadata database, so the record lives for this run only.
    let repository = Arc::new(InMemoryVideoRepository::new());
    let user_id = Uuid::new_v4();
    let video = Video::new(user_id, title);
    let video_id = video.id;
    repository.insert(video).await;

    let ctx = PipelineContext::from_config(config, storage, repository);
    let resolver = UrlResolver::from_context(&ctx);
    let pipeline = UploadPipeline::new(ctx);

    let body = tokio::fs::File::open(&file)
        .await
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let length = body.metadata().await?.len();
    let request = UploadRequest::new(content_type, body).with_content_length(length);

    let stored = pipeline.upload(video_id, user_id, request).await?;
    let signed = resolver.resolve(&stored).await?;

    print_json(&UploadOutput {
        video_id,
        reference: stored.video_url.unwrap_or_default(),
        signed_url: signed.video_url,
    })?;

    Ok(())
}
