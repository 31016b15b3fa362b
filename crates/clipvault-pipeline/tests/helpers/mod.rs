//! Test helpers: build an upload pipeline around in-process fakes.
//!
//! Run from workspace root: `cargo test -p clipvault-pipeline`.
//! No ffmpeg, ffprobe or object store is required.

#![allow(dead_code)]

pub mod fakes;

use clipvault_core::{Config, PipelineConfig, Video};
use clipvault_pipeline::{InMemoryVideoRepository, PipelineContext, UploadPipeline};
use clipvault_processing::ToolPool;
use clipvault_storage::{KeyGenerator, Storage};
use fakes::{FixedRandom, RecordingStorage, ScriptedRunner};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_BUCKET: &str = "clipvault-test";

/// Pipeline plus handles on every collaborator it was built with.
pub struct TestPipeline {
    pub pipeline: UploadPipeline,
    pub repository: Arc<InMemoryVideoRepository>,
    pub runner: Arc<ScriptedRunner>,
    pub temp_dir: TempDir,
}

impl TestPipeline {
    pub fn scratch(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Names of everything left in the scratch directory.
    pub fn leftover_files(&self) -> Vec<String> {
        std::fs::read_dir(self.scratch())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    /// Insert a video owned by a fresh user; returns `(video_id, user_id)`.
    pub async fn seed_video(&self) -> (Uuid, Uuid) {
        let user_id = Uuid::new_v4();
        let video = Video::new(user_id, "Boots: The Movie");
        let video_id = video.id;
        self.repository.insert(video).await;
        (video_id, user_id)
    }

    pub async fn stored_video(&self, id: Uuid) -> Video {
        use clipvault_pipeline::VideoRepository;
        self.repository.get_video(id).await.unwrap().unwrap()
    }
}

pub fn test_config(temp_dir: &Path, max_upload_bytes: u64) -> Config {
    Config::new(PipelineConfig {
        s3_bucket: Some(TEST_BUCKET.to_string()),
        s3_region: Some("us-east-1".to_string()),
        max_upload_size_bytes: max_upload_bytes,
        temp_dir: Some(temp_dir.to_path_buf()),
        ..PipelineConfig::default()
    })
}

pub fn setup_pipeline(runner: ScriptedRunner, storage: Arc<dyn Storage>) -> TestPipeline {
    setup_pipeline_with_limit(runner, storage, 1 << 30)
}

pub fn setup_pipeline_with_limit(
    runner: ScriptedRunner,
    storage: Arc<dyn Storage>,
    max_upload_bytes: u64,
) -> TestPipeline {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path(), max_upload_bytes);

    let runner = Arc::new(runner);
    let repository = Arc::new(InMemoryVideoRepository::new());
    let pool = ToolPool::new(runner.clone(), 2, Duration::from_secs(5));

    let ctx = PipelineContext::with_tools(&config, storage, repository.clone(), pool)
        .with_key_generator(KeyGenerator::new(Arc::new(FixedRandom(0))));

    TestPipeline {
        pipeline: UploadPipeline::new(ctx),
        repository,
        runner,
        temp_dir,
    }
}

pub fn recording_storage() -> Arc<RecordingStorage> {
    Arc::new(RecordingStorage::new(TEST_BUCKET))
}

/// Asset id produced by `FixedRandom(0)`: 32 zero bytes in URL-safe base64.
pub fn zero_asset_id() -> String {
    "A".repeat(43)
}
