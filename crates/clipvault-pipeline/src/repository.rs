//! Video record persistence.
//!
//! The metadata database is an outside collaborator; the pipeline only needs
//! to look a record up and overwrite its reference.

use async_trait::async_trait;
use chrono::Utc;
use clipvault_core::{AppError, Video};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Video {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Backend(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => AppError::NotFound(err.to_string()),
            RepositoryError::Backend(msg) => AppError::Database(msg),
        }
    }
}

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, RepositoryError>;

    /// Replace the stored reference and return the updated record.
    async fn update_video_url(&self, id: Uuid, reference: &str) -> Result<Video, RepositoryError>;
}

/// Process-local repository used by the CLI and tests
#[derive(Debug, Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<Uuid, Video>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, video: Video) {
        self.videos.write().await.insert(video.id, video);
    }

    pub async fn len(&self) -> usize {
        self.videos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.videos.read().await.is_empty()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, RepositoryError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn update_video_url(&self, id: Uuid, reference: &str) -> Result<Video, RepositoryError> {
        let mut videos = self.videos.write().await;
        let video = videos.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;

        video.video_url = Some(reference.to_string());
        video.updated_at = Utc::now();

        Ok(video.clone())
    }
}
