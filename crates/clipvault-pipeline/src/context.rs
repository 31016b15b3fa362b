//! Collaborators shared by the upload and read paths.
//!
//! Everything is passed in explicitly; nothing here reads the environment.

use crate::repository::VideoRepository;
use crate::validation::UploadValidator;
use clipvault_core::Config;
use clipvault_processing::{FastStartProcessor, MediaProbe, ToolPool};
use clipvault_storage::{KeyGenerator, Storage};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct PipelineContext {
    pub storage: Arc<dyn Storage>,
    pub repository: Arc<dyn VideoRepository>,
    pub keys: KeyGenerator,
    pub probe: MediaProbe,
    pub faststart: FastStartProcessor,
    pub validator: UploadValidator,
    pub temp_dir: PathBuf,
}

impl PipelineContext {
    /// Wire real tools and the OS random source from configuration.
    pub fn from_config(
        config: &Config,
        storage: Arc<dyn Storage>,
        repository: Arc<dyn VideoRepository>,
    ) -> Self {
        Self::with_tools(config, storage, repository, ToolPool::from_config(config))
    }

    /// Same as [`from_config`](Self::from_config) but with a caller-supplied
    /// tool pool, e.g. one backed by a scripted command runner.
    pub fn with_tools(
        config: &Config,
        storage: Arc<dyn Storage>,
        repository: Arc<dyn VideoRepository>,
        pool: ToolPool,
    ) -> Self {
        Self {
            storage,
            repository,
            keys: KeyGenerator::default(),
            probe: MediaProbe::new(pool.clone(), config.ffprobe_path()),
            faststart: FastStartProcessor::new(pool, config.ffmpeg_path()),
            validator: UploadValidator::from_config(config),
            temp_dir: config.temp_dir(),
        }
    }

    pub fn with_key_generator(mut self, keys: KeyGenerator) -> Self {
        self.keys = keys;
        self
    }
}
